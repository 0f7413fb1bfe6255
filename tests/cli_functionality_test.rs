use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::{tempdir, NamedTempFile};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLOUDS: &str = r#"
clouds:
  devstack:
    auth:
      auth_url: http://keystone.invalid:5000/v3
      username: admin
      password: s3cr3t
      project_name: admin
    region_name: RegionOne
"#;

fn clouds_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// The binary with a clean environment and the given clouds.yaml.
fn openstack(clouds: &Path) -> Command {
    let mut cmd = Command::cargo_bin("openstack").unwrap();
    cmd.env_clear().env("OS_CLIENT_CONFIG_FILE", clouds);
    cmd
}

#[test]
fn test_module_list_needs_no_credentials() {
    let clouds = clouds_file("clouds: {}\n");
    openstack(clouds.path())
        .args(["module", "list", "-f", "csv", "--headers"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("NAME,GROUP,VERSION_OPTION"))
        .stdout(predicate::str::contains("compute,openstack.cli.base,--os-compute-api-version"))
        .stdout(predicate::str::contains("object_store"));
}

#[test]
fn test_configuration_show_masks_secrets() {
    let clouds = clouds_file(CLOUDS);
    openstack(clouds.path())
        .args(["--os-cloud", "devstack", "configuration", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("***"))
        .stdout(predicate::str::contains("s3cr3t").not())
        .stdout(predicate::str::contains("RegionOne"));
}

#[test]
fn test_configuration_show_unmask() {
    let clouds = clouds_file(CLOUDS);
    openstack(clouds.path())
        .args(["--os-cloud", "devstack", "configuration", "show", "--unmask"])
        .assert()
        .success()
        .stdout(predicate::str::contains("s3cr3t"));
}

#[test]
fn test_unknown_cloud_is_a_configuration_error() {
    let clouds = clouds_file(CLOUDS);
    openstack(clouds.path())
        .args(["--os-cloud", "staging", "configuration", "show"])
        .assert()
        .failure()
        .code(exitcode::CONFIG)
        .stderr(predicate::str::contains("staging"));
}

#[test]
fn test_missing_credentials_fail_authentication() {
    let clouds = clouds_file("clouds: {}\n");
    // the placeholder token is rejected, the retry as password lacks auth_url
    openstack(clouds.path())
        .args(["server", "list"])
        .assert()
        .failure()
        .code(100)
        .stderr(predicate::str::contains("auth_url"));
}

/// The binary with a clean environment and no clouds.yaml override.
fn openstack_without_clouds_file() -> Command {
    let mut cmd = Command::cargo_bin("openstack").unwrap();
    cmd.env_clear();
    cmd
}

#[test]
fn test_clouds_file_found_in_config_dir() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("clouds.yaml"), CLOUDS).unwrap();
    let work = tempdir().unwrap();

    openstack_without_clouds_file()
        .current_dir(work.path())
        .env("OSC_CONFIG_DIR", dir.path())
        .args(["--os-cloud", "devstack", "configuration", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RegionOne"));
}

#[test]
fn test_config_dir_wins_over_working_directory() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("clouds.yaml"), CLOUDS).unwrap();
    let work = tempdir().unwrap();
    std::fs::write(
        work.path().join("clouds.yaml"),
        CLOUDS.replace("RegionOne", "LocalRegion"),
    )
    .unwrap();

    openstack_without_clouds_file()
        .current_dir(work.path())
        .env("OSC_CONFIG_DIR", dir.path())
        .args(["--os-cloud", "devstack", "configuration", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RegionOne"))
        .stdout(predicate::str::contains("LocalRegion").not());
}

#[test]
fn test_clouds_file_found_in_working_directory() {
    let work = tempdir().unwrap();
    std::fs::write(work.path().join("clouds.yaml"), CLOUDS).unwrap();

    openstack_without_clouds_file()
        .current_dir(work.path())
        .args(["--os-cloud", "devstack", "configuration", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("RegionOne"));
}

#[test]
fn test_missing_clouds_file_is_an_empty_configuration() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing.yaml");

    openstack(&missing)
        .args(["module", "list"])
        .assert()
        .success();
    openstack(&missing)
        .args(["configuration", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("interface"));
    // with no clouds at all, a named cloud is unknown
    openstack(&missing)
        .args(["--os-cloud", "devstack", "configuration", "show"])
        .assert()
        .failure()
        .code(exitcode::CONFIG);
}

#[test]
fn test_malformed_clouds_file_only_affects_cloud_commands() {
    let clouds = clouds_file("clouds: [not, a, mapping\n");

    openstack(clouds.path())
        .args(["module", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("compute"));
    openstack(clouds.path())
        .args(["configuration", "show"])
        .assert()
        .failure()
        .code(exitcode::CONFIG);
}

#[test]
fn test_verbose_flag_enables_debug_logging() {
    let clouds = clouds_file(CLOUDS);
    // -v combined with another short flag after the subcommand
    openstack(clouds.path())
        .args(["--os-cloud", "devstack", "configuration", "show", "-vf", "json"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Loading configuration from"));
    openstack(clouds.path())
        .args(["--os-cloud", "devstack", "configuration", "show"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Loading configuration from").not());
}

fn token_response(base: &str) -> ResponseTemplate {
    ResponseTemplate::new(201)
        .insert_header("X-Subject-Token", "gAAAAB-cli-token")
        .set_body_json(json!({
            "token": {
                "expires_at": "2026-10-15T12:00:00.000000Z",
                "user": {"id": "u-1", "name": "demo"},
                "project": {"id": "p-1", "name": "demo"},
                "catalog": [{
                    "type": "compute",
                    "name": "nova",
                    "endpoints": [{
                        "interface": "public",
                        "region": "RegionOne",
                        "url": format!("{}/compute/v2.1", base)
                    }]
                }]
            }
        }))
}

async fn mock_cloud() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/identity/v3/auth/tokens"))
        .respond_with(token_response(&server.uri()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/compute/v2.1/servers/detail"))
        .and(header("X-Auth-Token", "gAAAAB-cli-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "servers": [{"id": "s-1", "name": "web", "status": "ACTIVE", "addresses": {}}]
        })))
        .mount(&server)
        .await;
    server
}

fn password_args(auth_url: &str) -> Vec<String> {
    [
        "--os-auth-url",
        auth_url,
        "--os-username",
        "demo",
        "--os-password",
        "secret",
        "--os-project-name",
        "demo",
    ]
    .iter()
    .map(|arg| arg.to_string())
    .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_server_list_against_mock_cloud() {
    let server = mock_cloud().await;
    let auth_url = format!("{}/identity", server.uri());

    let output = tokio::task::spawn_blocking(move || {
        let clouds = clouds_file("clouds: {}\n");
        openstack(clouds.path())
            .args(password_args(&auth_url))
            .args(["server", "list", "-f", "value"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "s-1 web ACTIVE");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_network_list_refused_when_catalog_lacks_network() {
    let server = mock_cloud().await;
    let auth_url = format!("{}/identity", server.uri());

    let output = tokio::task::spawn_blocking(move || {
        let clouds = clouds_file("clouds: {}\n");
        openstack(clouds.path())
            .args(password_args(&auth_url))
            .args(["network", "list"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert_eq!(output.status.code(), Some(exitcode::UNAVAILABLE));
    assert!(String::from_utf8_lossy(&output.stderr).contains("network service is not enabled"));
}
