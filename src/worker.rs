use futures::{StreamExt, TryStreamExt, stream};
use log::{info, warn};
use std::io::Write;
use tokio::select;
use tokio_util::sync::CancellationToken;

use crate::client::StatusCakeClient;
use crate::error::Error;
use crate::models::TestDetail;
use crate::report::Table;

/// Fetches every test and its details, then writes the summary table to `out`.
///
/// # Behavior
///
/// - Retrieves the test list, then one detail record per listed test
/// - Keeps at most `concurrency` detail requests in flight, rows stay in list order
/// - Writes the table only once every detail has been fetched
///
/// The first failed request aborts the run and nothing is written. Cancelling
/// `token` has the same effect. Returns the number of rows written.
pub async fn run_report<W: Write>(
    client: &StatusCakeClient,
    concurrency: usize,
    token: &CancellationToken,
    out: &mut W,
) -> Result<usize, Error> {
    let details = select! {
        result = fetch_all(client, concurrency) => result?,
        () = token.cancelled() => {
            warn!("Shutdown requested, abandoning report");
            return Err(Error::Cancelled);
        }
    };

    let mut table = Table::new(1);
    for detail in &details {
        table.push_row(detail.row());
    }
    table.write_to(out)?;

    info!("Wrote {} rows", table.len());
    Ok(table.len())
}

async fn fetch_all(
    client: &StatusCakeClient,
    concurrency: usize,
) -> Result<Vec<TestDetail>, Error> {
    let summaries = client.list_tests().await?;
    info!("Retrieved {} tests", summaries.len());

    stream::iter(summaries)
        .map(|summary| async move {
            let detail = client.test_details(summary.test_id).await?;
            if detail.test_id != summary.test_id {
                warn!(
                    "Requested test {} but received details for test {}",
                    summary.test_id, detail.test_id
                );
            }
            Ok::<_, Error>(detail)
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use httpmock::prelude::*;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn client_for(server: &MockServer) -> StatusCakeClient {
        let settings = Settings {
            base_url: server.url("/API/").parse().expect("valid URL"),
            username: "alice".to_string(),
            apikey: "secret".to_string(),
            timeout: None,
            concurrency: 1,
        };
        StatusCakeClient::new(&settings).expect("client builds")
    }

    async fn mock_list<'a>(server: &'a MockServer, body: Value) -> httpmock::Mock<'a> {
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/API/Tests/")
                    .header("api", "secret")
                    .header("username", "alice");
                then.status(200).json_body(body);
            })
            .await
    }

    async fn mock_detail<'a>(
        server: &'a MockServer,
        id: &str,
        body: Value,
        delay: Duration,
    ) -> httpmock::Mock<'a> {
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/API/Tests/Details")
                    .query_param("TestID", id)
                    .header("api", "secret")
                    .header("username", "alice");
                then.status(200).delay(delay).json_body(body);
            })
            .await
    }

    async fn report(server: &MockServer, concurrency: usize) -> (Result<usize, Error>, String) {
        let client = client_for(server);
        let mut out = Vec::new();
        let result = run_report(&client, concurrency, &CancellationToken::new(), &mut out).await;
        (result, String::from_utf8(out).expect("utf-8 output"))
    }

    #[tokio::test]
    async fn test_rows_follow_list_order() {
        let server = MockServer::start_async().await;
        let list = mock_list(&server, json!([{"TestID": 1}, {"TestID": 2}])).await;
        let alpha = mock_detail(
            &server,
            "1",
            json!({"TestID": 1, "WebsiteName": "Alpha", "URI": "http://a", "Tags": ["x"]}),
            Duration::ZERO,
        )
        .await;
        let beta = mock_detail(
            &server,
            "2",
            json!({"TestID": 2, "WebsiteName": "Beta", "URI": "http://b", "Tags": []}),
            Duration::ZERO,
        )
        .await;

        let (result, output) = report(&server, 1).await;

        assert_eq!(result.unwrap(), 2);
        list.assert_async().await;
        alpha.assert_calls_async(1).await;
        beta.assert_calls_async(1).await;
        assert_eq!(output, " x Alpha http://a\n    Beta http://b\n");
    }

    #[tokio::test]
    async fn test_one_detail_request_per_listed_test() {
        let server = MockServer::start_async().await;
        mock_list(&server, json!([{"TestID": 5}, {"TestID": 5}, {"TestID": 9}])).await;
        let five = mock_detail(
            &server,
            "5",
            json!({"TestID": 5, "WebsiteName": "Five", "URI": "http://5"}),
            Duration::ZERO,
        )
        .await;
        let nine = mock_detail(
            &server,
            "9",
            json!({"TestID": 9, "WebsiteName": "Nine", "URI": "http://9"}),
            Duration::ZERO,
        )
        .await;

        let (result, output) = report(&server, 1).await;

        assert_eq!(result.unwrap(), 3);
        five.assert_calls_async(2).await;
        nine.assert_calls_async(1).await;
        let sites: Vec<&str> = output
            .lines()
            .map(|line| line.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(sites, vec!["Five", "Five", "Nine"]);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_keep_list_order() {
        let server = MockServer::start_async().await;
        mock_list(&server, json!([{"TestID": 1}, {"TestID": 2}, {"TestID": 3}])).await;
        mock_detail(
            &server,
            "1",
            json!({"WebsiteName": "Slow", "URI": "http://slow"}),
            Duration::from_millis(300),
        )
        .await;
        mock_detail(
            &server,
            "2",
            json!({"WebsiteName": "Fast", "URI": "http://fast"}),
            Duration::ZERO,
        )
        .await;
        mock_detail(
            &server,
            "3",
            json!({"WebsiteName": "Mid", "URI": "http://mid"}),
            Duration::from_millis(100),
        )
        .await;

        let (result, output) = report(&server, 3).await;

        assert_eq!(result.unwrap(), 3);
        let sites: Vec<&str> = output
            .lines()
            .map(|line| line.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(sites, vec!["Slow", "Fast", "Mid"]);
    }

    #[tokio::test]
    async fn test_empty_list_issues_no_detail_requests() {
        let server = MockServer::start_async().await;
        let list = mock_list(&server, json!([])).await;
        let details = server
            .mock_async(|when, then| {
                when.method(GET).path("/API/Tests/Details");
                then.status(200).json_body(json!({}));
            })
            .await;

        let (result, output) = report(&server, 1).await;

        assert_eq!(result.unwrap(), 0);
        list.assert_async().await;
        details.assert_calls_async(0).await;
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_null_list_is_treated_as_empty() {
        let server = MockServer::start_async().await;
        let list = mock_list(&server, Value::Null).await;
        let details = server
            .mock_async(|when, then| {
                when.method(GET).path("/API/Tests/Details");
                then.status(200).json_body(json!({}));
            })
            .await;

        let (result, output) = report(&server, 1).await;

        assert_eq!(result.unwrap(), 0);
        list.assert_async().await;
        details.assert_calls_async(0).await;
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_failed_detail_writes_nothing() {
        let server = MockServer::start_async().await;
        mock_list(&server, json!([{"TestID": 1}, {"TestID": 2}])).await;
        mock_detail(
            &server,
            "1",
            json!({"WebsiteName": "Alpha", "URI": "http://a"}),
            Duration::ZERO,
        )
        .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/API/Tests/Details")
                    .query_param("TestID", "2");
                then.status(500);
            })
            .await;

        let (result, output) = report(&server, 1).await;

        assert!(matches!(result, Err(Error::Status { .. })));
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_failed_list_skips_details() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/API/Tests/");
                then.status(401);
            })
            .await;
        let details = server
            .mock_async(|when, then| {
                when.method(GET).path("/API/Tests/Details");
                then.status(200).json_body(json!({}));
            })
            .await;

        let (result, output) = report(&server, 1).await;

        assert!(matches!(result, Err(Error::Status { .. })));
        details.assert_calls_async(0).await;
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_token_writes_nothing() {
        let server = MockServer::start_async().await;
        mock_list(&server, json!([{"TestID": 1}])).await;
        mock_detail(
            &server,
            "1",
            json!({"WebsiteName": "Alpha", "URI": "http://a"}),
            Duration::from_secs(5),
        )
        .await;

        let client = client_for(&server);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let mut out = Vec::new();
        let result = run_report(&client, 1, &token, &mut out).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(out.is_empty());
    }
}
