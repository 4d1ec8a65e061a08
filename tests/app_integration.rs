use std::fs;

mod test_utils {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Mounts an Alpha Vantage daily-series mock for one ticker.
    pub async fn mount_daily_series(server: &MockServer, ticker: &str, mock_response: &str) {
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "TIME_SERIES_DAILY"))
            .and(query_param("symbol", ticker))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(server)
            .await;
    }

    pub fn daily_series_body(close: &str) -> String {
        format!(
            r#"{{
                "Meta Data": {{ "1. Information": "Daily Prices" }},
                "Time Series (Daily)": {{
                    "2024-03-01": {{ "1. open": "0.00", "4. close": "{close}" }},
                    "2024-02-29": {{ "1. open": "0.00", "4. close": "1.00" }}
                }}
            }}"#
        )
    }
}

fn write_config(
    dir: &tempfile::TempDir,
    base_url: &str,
    extra_allocation: &str,
) -> std::path::PathBuf {
    let config_path = dir.path().join("config.yaml");
    let data_path = dir.path().join("data");
    let config_content = format!(
        r#"
categories:
  - id: DME
    name: "Domestic Equity"
    target_funds: "10000"
    ticker: "VTI"
  - id: PEQ
    name: "Private Equity"
    target_funds: "500"
    ticker: "PSP"
  - id: TBI
    name: "Bonds"
    target_funds: "3000"
allocation:
  price_increase_ratio: "1.03"
{extra_allocation}
providers:
  alpha_vantage:
    base_url: "{base_url}"
    api_key: "demo"
data_path: "{data_path}"
"#,
        data_path = data_path.display()
    );
    fs::write(&config_path, config_content).expect("Failed to write config file");
    config_path
}

#[test_log::test(tokio::test)]
async fn test_full_plan_flow_with_mock() {
    let mock_server = wiremock::MockServer::start().await;
    // DME is affordable at 95, PEQ's adjusted price (618) exceeds its 500
    // target, TBI has no ticker.
    test_utils::mount_daily_series(&mock_server, "VTI", &test_utils::daily_series_body("95.00"))
        .await;
    test_utils::mount_daily_series(&mock_server, "PSP", &test_utils::daily_series_body("600.00"))
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(&dir, &mock_server.uri(), "");

    let result = swal::run_command(
        swal::AppCommand::Plan,
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Plan command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_second_run_is_served_from_disk_cache() {
    let mock_server = wiremock::MockServer::start().await;

    // The mock only answers once; the second run must hit the disk cache.
    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/query"))
        .and(wiremock::matchers::query_param("symbol", "VTI"))
        .respond_with(
            wiremock::ResponseTemplate::new(200)
                .set_body_string(test_utils::daily_series_body("95.00")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = dir.path().join("config.yaml");
    let data_path = dir.path().join("data");
    let config_content = format!(
        r#"
categories:
  - id: DME
    name: "Domestic Equity"
    target_funds: "10000"
    ticker: "VTI"
providers:
  alpha_vantage:
    base_url: "{}"
data_path: "{}"
"#,
        mock_server.uri(),
        data_path.display()
    );
    fs::write(&config_path, config_content).expect("Failed to write config file");
    let config_path = config_path.to_str().unwrap();

    for _ in 0..2 {
        let result = swal::run_command(swal::AppCommand::Plan, Some(config_path)).await;
        assert!(
            result.is_ok(),
            "Plan command failed with: {:?}",
            result.err()
        );
    }

    mock_server.verify().await;
}

#[test_log::test(tokio::test)]
async fn test_provider_failures_never_abort_the_run() {
    let mock_server = wiremock::MockServer::start().await;
    // No mocks mounted: every lookup gets wiremock's 404 and every
    // category is skipped. The run still completes successfully.
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(&dir, &mock_server.uri(), "");

    let result = swal::run_command(
        swal::AppCommand::Plan,
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Plan command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_fixed_total_mode_runs() {
    let mock_server = wiremock::MockServer::start().await;
    test_utils::mount_daily_series(&mock_server, "VTI", &test_utils::daily_series_body("95.00"))
        .await;
    test_utils::mount_daily_series(&mock_server, "PSP", &test_utils::daily_series_body("600.00"))
        .await;

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(
        &dir,
        &mock_server.uri(),
        "  total_funds: \"50000\"\n  skip_unaffordable: false\n",
    );

    let result = swal::run_command(
        swal::AppCommand::Plan,
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Plan command failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_missing_config_is_fatal() {
    let result = swal::run_command(swal::AppCommand::Plan, Some("/nonexistent/config.yaml")).await;
    assert!(result.is_err());
}
