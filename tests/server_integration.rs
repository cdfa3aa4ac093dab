//! HTTP API tests: the real server on a free port, driven with `reqwest`.

use reqwest::multipart;
use serde_json::Value;
use tempfile::TempDir;

use creature_catalog::config::Config;
use creature_catalog::migrate;
use creature_catalog::server::run_server;

const POKEMON_CSV: &str = "\
#,Name,Type 1,Type 2,Total,HP,Attack,Defense,Sp. Atk,Sp. Def,Speed,Generation,Legendary
1,Bulbasaur,Grass,Poison,318,45,49,49,65,65,45,1,False
150,Mewtwo,Psychic,,680,106,110,90,154,90,130,1,True
249,Lugia,Psychic,Flying,680,106,90,130,90,154,110,2,True
";

const ASH: &str = "Bearer ash-token";
const MISTY: &str = "Bearer misty-token";

fn test_config(tmp: &TempDir, port: u16, max_upload_bytes: usize) -> Config {
    let config_content = format!(
        r#"
[db]
path = "{}/catalog.sqlite"

[server]
bind = "127.0.0.1:{}"

[import]
max_upload_bytes = {}

[auth.tokens]
"ash-token" = "ash"
"misty-token" = "misty"
"#,
        tmp.path().display(),
        port,
        max_upload_bytes
    );
    toml::from_str(&config_content).unwrap()
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

struct TestServer {
    _tmp: TempDir,
    base: String,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn start_server(max_upload_bytes: usize) -> TestServer {
    let tmp = TempDir::new().unwrap();
    let port = find_free_port();
    let cfg = test_config(&tmp, port, max_upload_bytes);
    migrate::run_migrations(&cfg).await.unwrap();

    let handle = tokio::spawn(async move {
        run_server(&cfg).await.ok();
    });
    wait_for_server(port).await;

    TestServer {
        _tmp: tmp,
        base: format!("http://127.0.0.1:{}", port),
        handle,
    }
}

async fn upload(
    client: &reqwest::Client,
    base: &str,
    auth: Option<&str>,
    csv: &str,
) -> reqwest::Response {
    let part = multipart::Part::bytes(csv.as_bytes().to_vec())
        .file_name("pokemon.csv")
        .mime_str("text/csv")
        .unwrap();
    let form = multipart::Form::new().part("file", part);
    let mut req = client
        .post(format!("{}/pokemons/import", base))
        .multipart(form);
    if let Some(auth) = auth {
        req = req.header("Authorization", auth);
    }
    req.send().await.unwrap()
}

async fn id_of(client: &reqwest::Client, base: &str, name: &str) -> String {
    let body: Value = client
        .get(format!("{}/pokemons?search={}", base, name))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["name"] == name)
        .and_then(|e| e["id"].as_str())
        .unwrap_or_else(|| panic!("{} not listed: {}", name, body))
        .to_string()
}

#[tokio::test]
async fn test_health() {
    let server = start_server(1024 * 1024).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/health", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_import_requires_auth() {
    let server = start_server(1024 * 1024).await;
    let client = reqwest::Client::new();

    let resp = upload(&client, &server.base, None, POKEMON_CSV).await;
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "unauthorized");

    let resp = upload(&client, &server.base, Some("Bearer wrong"), POKEMON_CSV).await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_import_list_and_toggle() {
    let server = start_server(1024 * 1024).await;
    let client = reqwest::Client::new();

    let resp = upload(&client, &server.base, Some(ASH), POKEMON_CSV).await;
    assert_eq!(resp.status(), 200);
    let summary: Value = resp.json().await.unwrap();
    assert_eq!(summary["success"], true);
    assert_eq!(summary["count"], 3);
    assert_eq!(summary["skipped"], 0);

    // anonymous listing: no isFavorite key
    let resp = client
        .get(format!("{}/pokemons?legendary=true&generation=1", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["totalPages"], 1);
    let mewtwo = &body["data"][0];
    assert_eq!(mewtwo["name"], "Mewtwo");
    assert!(mewtwo["type2"].is_null());
    assert_eq!(mewtwo["spAttack"], 154);
    assert!(mewtwo.get("isFavorite").is_none());
    let id = mewtwo["id"].as_str().unwrap().to_string();

    let toggle_url = format!("{}/pokemons/{}/favorite", server.base, id);
    let resp = client
        .post(&toggle_url)
        .header("Authorization", ASH)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["isFavorite"], true);

    let body: Value = client
        .get(format!("{}/pokemons/{}", server.base, id))
        .header("Authorization", ASH)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["isFavorite"], true);

    let body: Value = client
        .get(format!("{}/pokemons/{}", server.base, id))
        .header("Authorization", MISTY)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["isFavorite"], false);

    let body: Value = client
        .post(&toggle_url)
        .header("Authorization", ASH)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["isFavorite"], false);
}

#[tokio::test]
async fn test_favorites_listing() {
    let server = start_server(1024 * 1024).await;
    let client = reqwest::Client::new();
    upload(&client, &server.base, Some(ASH), POKEMON_CSV).await;

    let resp = client
        .get(format!("{}/pokemons/favorites", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let lugia = id_of(&client, &server.base, "Lugia").await;
    let bulbasaur = id_of(&client, &server.base, "Bulbasaur").await;
    for id in [&lugia, &bulbasaur] {
        client
            .post(format!("{}/pokemons/{}/favorite", server.base, id))
            .header("Authorization", ASH)
            .send()
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let body: Value = client
        .get(format!("{}/pokemons/favorites?limit=1", server.base))
        .header("Authorization", ASH)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["data"][0]["id"], bulbasaur.as_str());
    assert_eq!(body["data"][0]["isFavorite"], true);

    let body: Value = client
        .get(format!("{}/pokemons?limit=100", server.base))
        .header("Authorization", ASH)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    for entry in body["data"].as_array().unwrap() {
        let expected = entry["id"] == lugia.as_str() || entry["id"] == bulbasaur.as_str();
        assert_eq!(entry["isFavorite"], expected);
    }
}

#[tokio::test]
async fn test_error_responses() {
    let server = start_server(1024 * 1024).await;
    let client = reqwest::Client::new();
    upload(&client, &server.base, Some(ASH), POKEMON_CSV).await;

    let resp = client
        .get(format!("{}/pokemons?limit=500", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");

    let resp = client
        .get(format!("{}/pokemons?page=0", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .get(format!("{}/pokemons?legendary=maybe", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .get(format!("{}/pokemons/does-not-exist", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");

    let resp = client
        .post(format!("{}/pokemons/does-not-exist/favorite", server.base))
        .header("Authorization", ASH)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .post(format!("{}/pokemons/does-not-exist/favorite", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_malformed_upload_keeps_catalog() {
    let server = start_server(1024 * 1024).await;
    let client = reqwest::Client::new();
    upload(&client, &server.base, Some(ASH), POKEMON_CSV).await;

    let mut bad = b"name,type1\nZubat,Poison\n".to_vec();
    bad.extend_from_slice(b"\xc3\x28,\xa0\xa1\n");
    let part = multipart::Part::bytes(bad).file_name("bad.csv");
    let resp = client
        .post(format!("{}/pokemons/import", server.base))
        .header("Authorization", ASH)
        .multipart(multipart::Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "ingestion_failed");

    let body: Value = client
        .get(format!("{}/pokemons", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn test_upload_without_file_field() {
    let server = start_server(1024 * 1024).await;
    let client = reqwest::Client::new();

    let form = multipart::Form::new().text("note", "no file here");
    let resp = client
        .post(format!("{}/pokemons/import", server.base))
        .header("Authorization", ASH)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_oversized_upload_rejected() {
    let server = start_server(256).await;
    let client = reqwest::Client::new();

    let mut csv = String::from("name,type1\n");
    for i in 0..100 {
        csv.push_str(&format!("Mon{:03},Normal\n", i));
    }
    let resp = upload(&client, &server.base, Some(ASH), &csv).await;
    assert_eq!(resp.status(), 413);

    let body: Value = client
        .get(format!("{}/pokemons", server.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["total"], 0);
}
