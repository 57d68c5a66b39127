//! Build and deploy descriptors staged next to the generated application

use launchpad_core::domain::artifact::{MARKUP_FILE, SCRIPT_FILE, STYLE_FILE};
use launchpad_core::domain::slug::Slug;

pub const DOCKERFILE: &str = "Dockerfile";
pub const WORKFLOW_FILE: &str = "deploy.yml";
pub const WORKFLOW_PATH: &str = ".github/workflows/deploy.yml";

/// Port the container listens on
pub const CONTAINER_PORT: u16 = 8080;

const DOCKERFILE_TEMPLATE: &str = r#"FROM nginx:alpine

ENV PORT=@PORT@
RUN sed -i 's/listen       80;/listen       @PORT@;/' /etc/nginx/conf.d/default.conf
EXPOSE @PORT@

COPY @MARKUP@ /usr/share/nginx/html/@MARKUP@
COPY @STYLE@ /usr/share/nginx/html/@STYLE@
COPY @SCRIPT@ /usr/share/nginx/html/@SCRIPT@
"#;

const WORKFLOW_TEMPLATE: &str = r#"name: Deploy to Cloud Run

on:
  workflow_dispatch:
  push:
    branches: [ @BRANCH@ ]
    paths-ignore:
      - '.github/**'

env:
  APP_SLUG: @SLUG@
  PROJECT_ID: @PROJECT@
  REGION: @REGION@

jobs:
  deploy:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4

      - name: Authenticate to Google Cloud
        uses: google-github-actions/auth@v2
        with:
          credentials_json: ${{ secrets.@SECRET_NAME@ }}

      - uses: google-github-actions/setup-gcloud@v2

      - name: Build and push image
        run: |
          gcloud builds submit --suppress-logs --tag gcr.io/${{ env.PROJECT_ID }}/${{ env.APP_SLUG }}

      - name: Deploy to Cloud Run
        run: |
          gcloud run deploy ${{ env.APP_SLUG }} \
            --image gcr.io/${{ env.PROJECT_ID }}/${{ env.APP_SLUG }} \
            --platform managed \
            --region ${{ env.REGION }} \
            --allow-unauthenticated
"#;

/// Container build file serving the three artifact files from nginx
pub fn render_dockerfile() -> String {
    DOCKERFILE_TEMPLATE
        .replace("@PORT@", &CONTAINER_PORT.to_string())
        .replace("@MARKUP@", MARKUP_FILE)
        .replace("@STYLE@", STYLE_FILE)
        .replace("@SCRIPT@", SCRIPT_FILE)
}

/// Inputs of the CI workflow
///
/// Every name in the workflow comes from `slug`; nothing is recomputed from
/// the application name.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowParams<'a> {
    pub slug: &'a Slug,
    pub project_id: &'a str,
    pub region: &'a str,
    pub secret_name: &'a str,
    pub branch: &'a str,
}

/// CI workflow that builds the image and deploys the service
///
/// Runs on explicit dispatch and on application pushes to the branch;
/// pushes that only touch `.github/` are ignored.
pub fn render_workflow(params: WorkflowParams<'_>) -> String {
    WORKFLOW_TEMPLATE
        .replace("@BRANCH@", params.branch)
        .replace("@SLUG@", params.slug.as_str())
        .replace("@PROJECT@", params.project_id)
        .replace("@REGION@", params.region)
        .replace("@SECRET_NAME@", params.secret_name)
}
