//! HTTP history feed client against a local stand-in server

#[cfg(test)]
mod tests {
    use crate::feed::{DebankClient, FeedError, HistoryFeed};
    use crate::tests::support::{test_config, WALLET_A};
    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/history", addr)
    }

    // Echoes the request parameters back inside a one-item page
    async fn echo(Query(params): Query<HashMap<String, String>>, headers: HeaderMap) -> impl IntoResponse {
        let access_key = headers
            .get("AccessKey")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let start_time = params.get("start_time").cloned().unwrap_or_default();

        Json(json!({
            "history_list": [{
                "id": params.get("id").cloned().unwrap_or_default(),
                "chain": "eth",
                "time_at": 1_700_000_000.75,
                "cate_id": null,
                "sends": null,
                "receives": [{ "token_id": "eth", "amount": 1.5, "from_addr": null }],
                "tx": { "name": access_key, "to_addr": start_time },
                "debt_liquidated": null
            }],
            "project_dict": null,
            "token_dict": {
                "eth": { "id": "eth", "chain": "eth", "symbol": "ETH", "price": 2000.0 }
            }
        }))
    }

    #[tokio::test]
    async fn test_fetch_page_sends_cursor_and_access_key() {
        let url = serve(Router::new().route("/history", get(echo))).await;
        let client = DebankClient::new(&test_config(&url)).unwrap();

        let first = client.fetch_page(WALLET_A, None).await.unwrap();
        let item = &first.history_list[0];
        assert_eq!(item.id.as_deref(), Some(WALLET_A));
        assert_eq!(item.tx.name.as_deref(), Some("test-access-key"));
        assert_eq!(item.tx.to_addr.as_deref(), Some(""), "no cursor on the first page");

        let older = client.fetch_page(WALLET_A, Some(1_699_999_000)).await.unwrap();
        assert_eq!(older.history_list[0].tx.to_addr.as_deref(), Some("1699999000"));
    }

    #[tokio::test]
    async fn test_page_decoding_tolerates_nulls_and_keeps_unknown_fields() {
        let url = serve(Router::new().route("/history", get(echo))).await;
        let client = DebankClient::new(&test_config(&url)).unwrap();

        let page = client.fetch_page(WALLET_A, None).await.unwrap();

        assert!(page.project_dict.is_empty());
        assert!(page.cex_dict.is_empty());
        assert!(page.has_reference_data());

        let item = &page.history_list[0];
        assert!(item.sends.is_empty());
        assert_eq!(item.receives.len(), 1);
        assert!(!item.is_scam);
        assert_eq!(item.timestamp(), Some(1_700_000_000));
        assert!(item.extra.contains_key("debt_liquidated"));

        let tokens: Vec<_> = page.tokens().collect();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].id, "eth");
        assert_eq!(tokens[0].price, Some(2000.0));
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let router = Router::new().route(
            "/history",
            get(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let url = serve(router).await;
        let client = DebankClient::new(&test_config(&url)).unwrap();

        match client.fetch_page(WALLET_A, None).await {
            Err(FeedError::Status { status, body }) => {
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
                assert_eq!(body, "slow down");
            }
            other => panic!("expected a status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_decode_error() {
        let router = Router::new().route("/history", get(|| async { "<html>maintenance</html>" }));
        let url = serve(router).await;
        let client = DebankClient::new(&test_config(&url)).unwrap();

        let result = client.fetch_page(WALLET_A, None).await;
        assert!(matches!(result, Err(FeedError::Decode(_))), "got {:?}", result);
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_a_request_error() {
        // Bind and drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = DebankClient::new(&test_config(&format!("http://{}/history", addr))).unwrap();
        let result = client.fetch_page(WALLET_A, None).await;
        assert!(matches!(result, Err(FeedError::Request(_))), "got {:?}", result);
    }

    #[tokio::test]
    async fn test_rate_limited_client_still_fetches() {
        let url = serve(Router::new().route("/history", get(echo))).await;
        let mut config = test_config(&url);
        config.feed_rate_limit = Some(100);
        let client = DebankClient::new(&config).unwrap();

        for _ in 0..3 {
            let page = client.fetch_page(WALLET_A, None).await.unwrap();
            assert_eq!(page.history_list.len(), 1);
        }
    }
}
