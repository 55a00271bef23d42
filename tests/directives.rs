//! End-to-end directive handling over a real socket.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use echo_server::config::TransportMode;

mod common;

#[tokio::test]
async fn test_single_status_code() {
    let server = common::start_server(common::config_with(TransportMode::Async)).await;
    let client = common::client();

    for code in [201, 302, 404, 418, 503, 599] {
        let res = client
            .get(server.url(&format!("/?echo_code={code}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status().as_u16(), code);
    }

    server.stop().await;
}

#[tokio::test]
async fn test_status_list_is_random_member() {
    let server = common::start_server(common::config_with(TransportMode::Async)).await;
    let client = common::client();

    let mut seen = HashSet::new();
    for _ in 0..60 {
        let res = client
            .get(server.url("/"))
            .header("x-echo-code", "200-404-500")
            .send()
            .await
            .unwrap();
        let code = res.status().as_u16();
        assert!([200, 404, 500].contains(&code), "unexpected status {code}");
        seen.insert(code);
    }
    assert_eq!(seen.len(), 3, "all candidates should appear over 60 draws");

    server.stop().await;
}

#[tokio::test]
async fn test_malformed_status_degrades_to_200() {
    let server = common::start_server(common::config_with(TransportMode::Async)).await;
    let client = common::client();

    for raw in ["abc-999-x", "700", "teapot", "99"] {
        let res = client
            .get(server.url("/"))
            .header("x-echo-code", raw)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200, "directive {raw:?}");
    }

    server.stop().await;
}

#[tokio::test]
async fn test_header_directive_wins_over_query() {
    let server = common::start_server(common::config_with(TransportMode::Async)).await;
    let client = common::client();

    let res = client
        .post(server.url("/?echo_body=B"))
        .header("X-Echo-Body", "A")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.text().await.unwrap(), "A");

    server.stop().await;
}

#[tokio::test]
async fn test_env_body_reads_named_variable() {
    let server = common::start_server(common::config_with(TransportMode::Async)).await;
    let client = common::client();

    let body = client
        .get(server.url("/?echo_env_body=PATH"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, std::env::var("PATH").unwrap_or_default());

    let body = client
        .get(server.url("/?echo_env_body=ECHO_SERVER_SURELY_UNSET_VARIABLE"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "");

    server.stop().await;
}

#[tokio::test]
async fn test_custom_headers_replace_content_type() {
    let server = common::start_server(common::config_with(TransportMode::Async)).await;
    let client = common::client();

    let res = client
        .get(server.url("/"))
        .header("x-echo-header", "Header1:value1, Header2:value2")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["header1"], "value1");
    assert_eq!(res.headers()["header2"], "value2");
    assert!(res.headers().get("content-type").is_none());
    assert_eq!(res.headers()["server"], "echo-server");

    server.stop().await;
}

#[tokio::test]
async fn test_set_cookie_directive_keeps_attributes() {
    let server = common::start_server(common::config_with(TransportMode::Async)).await;
    let client = common::client();

    let res = client
        .get(server.url("/"))
        .header(
            "x-echo-header",
            "Set-Cookie:sessionid=abc123; Path=/; HttpOnly, userid=456; Secure",
        )
        .send()
        .await
        .unwrap();
    let cookies: Vec<_> = res
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(cookies, ["sessionid=abc123; Path=/; HttpOnly", "userid=456; Secure"]);

    server.stop().await;
}

#[tokio::test]
async fn test_repeated_set_cookie_headers() {
    let server = common::start_server(common::config_with(TransportMode::Async)).await;
    let client = common::client();

    let res = client
        .get(server.url("/"))
        .header("x-echo-header", "Set-Cookie:a=1, Set-Cookie:b=2, X-Other:z")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers().get_all("set-cookie").iter().count(), 2);
    assert_eq!(res.headers()["x-other"], "z");

    server.stop().await;
}

#[tokio::test]
async fn test_delay_is_clamped_to_max() {
    let mut config = common::config_with(TransportMode::Async);
    config.timing.max_delay_ms = 300;
    let server = common::start_server(config).await;
    let client = common::client();

    let started = Instant::now();
    let res = client
        .get(server.url("/?echo_time=5000"))
        .send()
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(res.status(), 200);
    assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(3000), "{elapsed:?}");

    server.stop().await;
}

#[tokio::test]
async fn test_default_echo_sections() {
    let server = common::start_server(common::config_with(TransportMode::Async)).await;
    let client = common::client();

    let echo: serde_json::Value = client
        .post(server.url("/orders/9?tag=a&tag=b"))
        .header("Cookie", "sid=xyz; lang=en")
        .body("hello")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(echo["host"]["hostname"].is_string());
    assert_eq!(echo["host"]["ips"][0], "127.0.0.1");
    assert_eq!(echo["http"]["method"], "POST");
    assert_eq!(echo["http"]["baseUrl"], format!("http://{}", server.addr));
    assert_eq!(echo["http"]["originalUrl"], "/orders/9?tag=a&tag=b");
    assert_eq!(echo["request"]["query"]["tag"], serde_json::json!(["a", "b"]));
    assert_eq!(echo["request"]["body"], "hello");
    assert_eq!(echo["request"]["remoteAddress"], "127.0.0.1");
    assert_eq!(echo["request"]["cookies"]["lang"], "en");
    assert_eq!(echo["server"]["port"], server.addr.port());
    assert!(echo["server"]["instanceId"].is_string());

    server.stop().await;
}

#[tokio::test]
async fn test_default_echo_sections_can_be_disabled() {
    let mut config = common::config_with(TransportMode::Async);
    config.features.host = false;
    config.features.http = false;
    config.features.request = false;
    let server = common::start_server(config).await;

    let echo: serde_json::Value = common::client()
        .get(server.url("/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(echo.get("host").is_none());
    assert!(echo.get("http").is_none());
    assert!(echo.get("request").is_none());
    assert!(echo.get("server").is_some());

    server.stop().await;
}

#[tokio::test]
async fn test_oversized_body_is_echoed_empty() {
    let mut config = common::config_with(TransportMode::Async);
    config.limits.max_body_size = 8;
    let server = common::start_server(config).await;

    let echo: serde_json::Value = common::client()
        .post(server.url("/"))
        .body("this body is far too long")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(echo["request"]["body"], "");

    server.stop().await;
}

#[tokio::test]
async fn test_config_update_is_applied() {
    let server = common::start_server(common::config_with(TransportMode::Async)).await;
    let client = common::client();

    let mut config = common::config_with(TransportMode::Async);
    config.logging.app_name = "reloaded-echo".into();
    config.commands.http_body_query = "say".into();
    server.config_tx.send(config).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client.get(server.url("/?say=hi")).send().await.unwrap();
    assert_eq!(res.headers()["server"], "reloaded-echo");
    assert_eq!(res.text().await.unwrap(), "hi");

    server.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_framing_header_directive_is_ignored() {
    for transport in [TransportMode::Async, TransportMode::Serial] {
        let server = common::start_server(common::config_with(transport)).await;

        for framing in ["Content-Length:2", "Transfer-Encoding:gzip, X-Extra:1"] {
            let res = common::client()
                .get(server.url("/?echo_body=hello"))
                .header("x-echo-header", framing)
                .send()
                .await
                .unwrap();
            assert_eq!(res.status(), 200, "{transport:?} {framing}");
            assert_eq!(res.text().await.unwrap(), "hello");
        }

        server.stop().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_informational_status_becomes_error_envelope() {
    for transport in [TransportMode::Async, TransportMode::Serial] {
        let server = common::start_server(common::config_with(transport)).await;

        let res = common::client()
            .get(server.url("/?echo_code=100&echo_body=hi"))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 500, "{transport:?}");
        assert_eq!(res.headers()["content-type"], "application/json");
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["error"]["code"], 500);

        server.stop().await;
    }
}
