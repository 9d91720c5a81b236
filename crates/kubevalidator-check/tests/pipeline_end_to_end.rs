//! End-to-end runs of the check pipeline against a repository checked out
//! into a temporary directory and an on-disk schema mirror.
//!
//! Candidates are validated inside `spawn_blocking`, so every test runs on
//! the multi-threaded runtime.

use std::path::Path;
use std::sync::Arc;

use kubevalidator_check::{Pipeline, RepoContext, WorkingTree, CHECK_RUN_NAME};
use kubevalidator_core::{Conclusion, LineRange, Report};
use kubevalidator_schema::{CachingSchemaSource, DirectorySchemaSource, KubeSchemaValidator};
use serde_json::json;
use tempfile::TempDir;

const CONFIG: &str = "\
apiVersion: v1alpha1
kind: KubeValidatorConfig
spec:
  manifests:
    - glob: k8s/*.yaml
";

const BAD_REPLICAS: &str = "\
apiVersion: apps/v1
kind: Deployment
spec:
  replicas: \"not-a-number\"
metadata:
  name: web
";

const GOOD_DEPLOYMENT: &str = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: web
spec:
  replicas: 3
";

const MISSPELLED_SERVICE: &str = "\
apiVersion: v1
kind: Service
metadata:
  name: web
spec:
  ports: []
  selectr:
    app: web
";

struct Fixture {
    repo: TempDir,
    schemas: TempDir,
}

fn write(root: &Path, path: &str, contents: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(full, contents).unwrap();
}

impl Fixture {
    fn new() -> Self {
        let schemas = tempfile::tempdir().unwrap();
        let deployment = json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "apiVersion": { "type": "string" },
                "kind": { "type": "string" },
                "metadata": { "type": "object" },
                "spec": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": { "replicas": { "type": "integer" } }
                }
            }
        });
        let service = json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "apiVersion": { "type": "string" },
                "kind": { "type": "string" },
                "metadata": { "type": "object" },
                "spec": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {
                        "ports": { "type": "array" },
                        "selector": { "type": "object" }
                    }
                }
            }
        });
        write(
            schemas.path(),
            "master-standalone-strict/deployment-apps-v1.json",
            &deployment.to_string(),
        );
        write(
            schemas.path(),
            "master-standalone-strict/service-v1.json",
            &service.to_string(),
        );

        Self {
            repo: tempfile::tempdir().unwrap(),
            schemas,
        }
    }

    fn with_config(self, config: &str) -> Self {
        write(self.repo.path(), ".github/kubevalidator.yaml", config);
        self
    }

    fn with_file(self, path: &str, contents: &str) -> Self {
        write(self.repo.path(), path, contents);
        self
    }

    fn pipeline(&self) -> Pipeline {
        let source = CachingSchemaSource::new(DirectorySchemaSource::new(self.schemas.path()));
        Pipeline::new(
            Arc::new(WorkingTree::new(self.repo.path())),
            Arc::new(KubeSchemaValidator::new(Arc::new(source))),
        )
        .with_jobs(2)
    }

    async fn run(&self, changed: &[&str]) -> Report {
        let ctx = RepoContext::new("abc123").with_repository("acme/deploys");
        let changed: Vec<String> = changed.iter().map(|p| p.to_string()).collect();
        self.pipeline().run(&ctx, &changed).await.unwrap()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn wrong_type_is_reported_on_its_line() {
    let fixture = Fixture::new()
        .with_config(CONFIG)
        .with_file("k8s/web.yaml", BAD_REPLICAS);
    let report = fixture.run(&["k8s/web.yaml"]).await;

    assert_eq!(report.conclusion(), Some(Conclusion::Failure));
    assert_eq!(report.title(), "1 file checked, 1 error");
    assert_eq!(report.annotations().len(), 1);

    let annotation = &report.annotations()[0];
    assert_eq!(annotation.path(), "k8s/web.yaml");
    assert_eq!(annotation.lines(), LineRange::line(4));
    assert_eq!(annotation.title(), "Error validating Deployment against master schema");
    assert!(annotation.message().starts_with("spec.replicas: "));
    assert_eq!(
        annotation.blob_url(),
        Some("https://github.com/acme/deploys/blob/abc123/k8s/web.yaml")
    );
    assert!(annotation.raw_details().unwrap().contains("* field: spec.replicas\n"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unexpected_property_is_reported_on_its_key() {
    let fixture = Fixture::new()
        .with_config(CONFIG)
        .with_file("k8s/svc.yaml", MISSPELLED_SERVICE);
    let report = fixture.run(&["k8s/svc.yaml"]).await;

    assert_eq!(report.annotations().len(), 1);
    assert_eq!(report.annotations()[0].lines(), LineRange::new(7, 8));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn conforming_files_succeed() {
    let fixture = Fixture::new()
        .with_config(CONFIG)
        .with_file("k8s/a.yaml", GOOD_DEPLOYMENT)
        .with_file("k8s/b.yaml", GOOD_DEPLOYMENT);
    let report = fixture.run(&["k8s/b.yaml", "k8s/a.yaml"]).await;

    assert_eq!(report.conclusion(), Some(Conclusion::Success));
    assert_eq!(report.title(), "2 files checked, 0 errors");
    assert!(report.annotations().is_empty());
    assert_eq!(
        report.summary(),
        "* [`./k8s/a.yaml`](https://github.com/acme/deploys/blob/abc123/k8s/a.yaml)\n\
         * [`./k8s/b.yaml`](https://github.com/acme/deploys/blob/abc123/k8s/b.yaml)"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn repeated_runs_agree() {
    let fixture = Fixture::new()
        .with_config(CONFIG)
        .with_file("k8s/web.yaml", BAD_REPLICAS)
        .with_file("k8s/svc.yaml", MISSPELLED_SERVICE)
        .with_file("k8s/ok.yaml", GOOD_DEPLOYMENT);
    let changed = ["k8s/web.yaml", "k8s/svc.yaml", "k8s/ok.yaml"];
    let first = fixture.run(&changed).await;
    let second = fixture.run(&changed).await;

    assert_eq!(first.title(), "3 files checked, 2 errors");
    assert_eq!(first.title(), second.title());
    assert_eq!(first.summary(), second.summary());
    assert_eq!(first.annotations(), second.annotations());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unmatched_changes_are_neutral() {
    let fixture = Fixture::new()
        .with_config(CONFIG)
        .with_file("README.md", "# deploys\n");
    let report = fixture.run(&["README.md"]).await;

    assert_eq!(report.conclusion(), Some(Conclusion::Neutral));
    assert_eq!(report.title(), "No files to validate");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_configuration_is_neutral() {
    let fixture = Fixture::new().with_file("k8s/web.yaml", BAD_REPLICAS);
    let report = fixture.run(&["k8s/web.yaml"]).await;

    assert_eq!(report.conclusion(), Some(Conclusion::Neutral));
    assert_eq!(report.title(), "No configuration");
    assert!(report.annotations().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_configuration_fails_on_the_config_file() {
    let fixture = Fixture::new()
        .with_config("apiVersion: v1alpha1\nkind: Wrong\nspec:\n  manifests:\n    - glob: k8s/*.yaml\n")
        .with_file("k8s/web.yaml", GOOD_DEPLOYMENT);
    let report = fixture.run(&["k8s/web.yaml"]).await;

    assert_eq!(report.conclusion(), Some(Conclusion::Failure));
    assert_eq!(report.title(), "Configuration invalid");
    assert_eq!(report.annotations().len(), 1);
    let annotation = &report.annotations()[0];
    assert_eq!(annotation.path(), ".github/kubevalidator.yaml");
    assert_eq!(annotation.title(), "Schema validation error");
    assert_eq!(annotation.lines(), LineRange::line(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreadable_file_yields_one_load_error() {
    let fixture = Fixture::new()
        .with_config(CONFIG)
        .with_file("k8s/ok.yaml", GOOD_DEPLOYMENT);
    let report = fixture.run(&["k8s/gone.yaml", "k8s/ok.yaml"]).await;

    assert_eq!(report.title(), "2 files checked, 1 error");
    assert_eq!(report.annotations().len(), 1);
    assert_eq!(report.annotations()[0].title(), "Error loading k8s/gone.yaml");
    assert!(report.annotations()[0].lines().is_fallback());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unknown_kind_is_an_internal_error() {
    let fixture = Fixture::new()
        .with_config(CONFIG)
        .with_file("k8s/cm.yaml", "apiVersion: v1\nkind: ConfigMap\ndata: {}\n");
    let report = fixture.run(&["k8s/cm.yaml"]).await;

    assert_eq!(report.annotations().len(), 1);
    let annotation = &report.annotations()[0];
    assert!(annotation
        .title()
        .starts_with("Internal error when validating ConfigMap against master schemas from "));
    assert!(annotation.message().contains("Problem loading schema"));
}

#[test]
fn check_run_name_is_stable() {
    assert_eq!(CHECK_RUN_NAME, "Kubernetes YAML");
}
