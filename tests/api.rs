use actix_web::{test, web, App};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tastebud_server::{
    configure_routes, spotify::UserProfile, AppState, Settings, TokenSet, User,
};
use wiremock::{
    matchers::{body_string_contains, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

async fn test_state(server: &MockServer, llm_url: Option<String>) -> AppState {
    let mut config = Settings::with_defaults().expect("Failed to load test config");
    config.database.url = "sqlite::memory:".into();
    config.database.max_connections = 1;
    config.spotify.token_url = format!("{}/api/token", server.uri());
    config.spotify.api_base_url = format!("{}/v1", server.uri());
    match llm_url {
        Some(url) => config.llm.base_url = url,
        None => config.llm.enabled = false,
    }
    AppState::new(config).await.expect("Failed to build state")
}

async fn seed_user(state: &AppState, id: &str, access_token: &str, refresh_token: Option<&str>, expires_in: i64) {
    let profile = UserProfile {
        spotify_id: id.into(),
        display_name: format!("{} name", id),
        email: format!("{}@example.com", id),
        followers: 1,
        profile_url: String::new(),
        image_url: None,
        plan_type: "free".into(),
    };
    let tokens = TokenSet {
        access_token: access_token.into(),
        refresh_token: refresh_token.map(String::from),
        expires_in,
        expires_at: Utc::now() + Duration::seconds(expires_in),
    };
    state.db.upsert_user(&User::from_login(profile, &tokens)).await.unwrap();
}

async fn mount_top_items(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "t1", "name": "First", "popularity": 10, "uri": "spotify:track:t1",
                  "artists": [{ "name": "Band" }], "album": { "name": "LP" } },
                { "id": "t2", "name": "Second", "popularity": 30, "uri": "spotify:track:t2" }
            ]
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/artists"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "a1", "name": "Band", "genres": ["pop", "rock"], "uri": "spotify:artist:a1" },
                { "id": "a2", "name": "Singer", "genres": ["pop"], "uri": "spotify:artist:a2" }
            ]
        })))
        .mount(server)
        .await;
}

#[actix_web::test]
async fn test_profile_stores_snapshot() {
    let server = MockServer::start().await;
    mount_top_items(&server, "A").await;

    let state = test_state(&server, None).await;
    seed_user(&state, "u1", "A", Some("R"), 3600).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::get().uri("/user/profile?user_id=u1").send_request(&app).await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["id"], "u1");
    assert_eq!(body["top_genres"], json!(["pop", "rock"]));
    assert_eq!(body["listening_stats"], json!({
        "total_tracks": 2,
        "avg_popularity": 20.0,
        "max_popularity": 30,
        "min_popularity": 10
    }));
    assert!(body.get("access_token").is_none());

    let resp = test::TestRequest::get().uri("/user/stats/latest?user_id=u1").send_request(&app).await;
    assert_eq!(resp.status(), 200);
    let snapshot: Value = test::read_body_json(resp).await;
    assert_eq!(snapshot["user_id"], "u1");
    assert_eq!(snapshot["top_tracks"][1]["id"], "t2");
}

#[actix_web::test]
async fn test_unknown_user_is_not_found() {
    let server = MockServer::start().await;
    let state = test_state(&server, None).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::get().uri("/user/profile?user_id=ghost").send_request(&app).await;
    assert_eq!(resp.status(), 404);

    let resp = test::TestRequest::get().uri("/user/stats/latest?user_id=ghost").send_request(&app).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_expired_token_is_refreshed_and_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("refresh_token=R"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_top_items(&server, "fresh").await;

    let state = test_state(&server, None).await;
    seed_user(&state, "u1", "stale", Some("R"), -60).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::get().uri("/user/profile?user_id=u1").send_request(&app).await;
    assert_eq!(resp.status(), 200);

    let user = state.db.get_user("u1").await.unwrap().unwrap();
    assert_eq!(user.access_token, "fresh");
    assert_eq!(user.refresh_token.as_deref(), Some("R"));
    assert!(!user.is_token_expired());
}

#[actix_web::test]
async fn test_expired_token_without_refresh_token() {
    let server = MockServer::start().await;
    let state = test_state(&server, None).await;
    seed_user(&state, "u1", "stale", None, -60).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::get().uri("/playlists?user_id=u1").send_request(&app).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_upstream_failure_surfaces_as_bad_gateway() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/playlists"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let state = test_state(&server, None).await;
    seed_user(&state, "u1", "A", Some("R"), 3600).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::get().uri("/playlists?user_id=u1").send_request(&app).await;
    assert_eq!(resp.status(), 502);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("maintenance"));
}

#[actix_web::test]
async fn test_create_playlist_and_add_tracks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/users/u1/playlists"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "p1",
            "name": "Road Trip",
            "description": "long drives",
            "uri": "spotify:playlist:p1"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/playlists/p1/tracks"))
        .respond_with(ResponseTemplate::new(201))
        .expect(2)
        .mount(&server)
        .await;

    let state = test_state(&server, None).await;
    seed_user(&state, "u1", "A", Some("R"), 3600).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::post()
        .uri("/playlists/create?user_id=u1")
        .set_json(json!({ "name": "Road Trip", "description": "long drives", "public": true }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["id"], "p1");

    let uris: Vec<String> = (0..150).map(|i| format!("spotify:track:{}", i)).collect();
    let resp = test::TestRequest::post()
        .uri("/playlists/p1/add-tracks?user_id=u1")
        .set_json(json!({ "track_uris": uris }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Added 150 tracks");

    let resp = test::TestRequest::get().uri("/playlists/records?user_id=u1").send_request(&app).await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["spotify_playlist_id"], "p1");
    assert_eq!(records[0]["track_count"], 150);
    assert_eq!(records[0]["public"], true);

    let resp = test::TestRequest::get().uri("/playlists/records?user_id=ghost").send_request(&app).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_create_playlist_requires_name() {
    let server = MockServer::start().await;
    let state = test_state(&server, None).await;
    seed_user(&state, "u1", "A", Some("R"), 3600).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::post()
        .uri("/playlists/create?user_id=u1")
        .set_json(json!({ "name": "  " }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_blend_two_users() {
    let server = MockServer::start().await;
    mount_top_items(&server, "A").await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/artists"))
        .and(header("authorization", "Bearer B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "b1", "name": "Crew", "genres": ["rock", "metal"] }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me/top/tracks"))
        .and(header("authorization", "Bearer B"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "id": "t2", "name": "Second", "popularity": 30 },
                { "id": "t9", "name": "Ninth", "popularity": 90 }
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/recommendations"))
        .and(query_param("seed_artists", "a1,a2,b1"))
        .and(query_param("seed_genres", "pop,rock,metal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracks": [{ "id": "r1", "name": "Rec", "uri": "spotify:track:r1" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let state = test_state(&server, None).await;
    seed_user(&state, "u1", "A", Some("R"), 3600).await;
    seed_user(&state, "u2", "B", Some("R2"), 3600).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::post()
        .uri("/blend")
        .set_json(json!({ "user_id1": "u1", "user_id2": "u2" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    // {rock} / {pop, rock, metal}
    assert_eq!(body["similarity_score"], 0.33);
    assert_eq!(body["shared_genres"], json!(["rock"]));
    assert_eq!(body["user1_unique_genres"], json!(["pop"]));
    assert_eq!(body["user2_unique_genres"], json!(["metal"]));
    assert_eq!(body["playlist_name"], "u1 name + u2 name Blend");
    let combined: Vec<&str> = body["combined_tracks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_str().unwrap())
        .collect();
    assert_eq!(combined, vec!["t1", "t2", "t9"]);
    assert_eq!(body["recommendations"][0]["id"], "r1");
}

#[actix_web::test]
async fn test_blend_missing_user() {
    let server = MockServer::start().await;
    let state = test_state(&server, None).await;
    seed_user(&state, "u1", "A", Some("R"), 3600).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::post()
        .uri("/blend")
        .set_json(json!({ "user_id1": "u1", "user_id2": "ghost" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_ai_summary_uses_model_output() {
    let server = MockServer::start().await;
    let llm = MockServer::start().await;
    mount_top_items(&server, "A").await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .and(body_string_contains("Top genres: pop, rock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "  A pop lover with a rock streak.  "
        })))
        .mount(&llm)
        .await;

    let state = test_state(&server, Some(llm.uri())).await;
    seed_user(&state, "u1", "A", Some("R"), 3600).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::post()
        .uri("/ai/summary")
        .set_json(json!({ "user_id": "u1", "prompt": "" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["summary"], "A pop lover with a rock streak.");
    assert_eq!(body["taste_profile"]["diversity"], 2);
    assert_eq!(body["taste_profile"]["top_track"], "First");
    assert_eq!(body["taste_profile"]["top_artist"], "Band");
}

#[actix_web::test]
async fn test_ai_mood_falls_back_when_model_is_down() {
    let server = MockServer::start().await;
    let llm = MockServer::start().await;
    mount_top_items(&server, "A").await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&llm)
        .await;

    let state = test_state(&server, Some(llm.uri())).await;
    seed_user(&state, "u1", "A", Some("R"), 3600).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::post()
        .uri("/ai/mood")
        .set_json(json!({ "user_id": "u1", "prompt": "" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["mood"].as_str().unwrap().starts_with("Your taste spans across diverse genres"));
    assert_eq!(body["top_artists"], json!(["Band", "Singer"]));
}

#[actix_web::test]
async fn test_ai_fix_finds_playlist_by_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/me/playlists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "p1", "name": "Late Night", "uri": "spotify:playlist:p1" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/playlists/p1/tracks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "track": { "id": "t1", "name": "First" } }]
        })))
        .mount(&server)
        .await;

    let state = test_state(&server, None).await;
    seed_user(&state, "u1", "A", Some("R"), 3600).await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes)
    ).await;

    let resp = test::TestRequest::post()
        .uri("/ai/fix")
        .set_json(json!({ "user_id": "u1", "prompt": "late night" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["track_count"], 1);
    assert_eq!(body["analysis"], "Your playlist 'late night' has 1 tracks with good variety.");

    let resp = test::TestRequest::post()
        .uri("/ai/fix")
        .set_json(json!({ "user_id": "u1", "prompt": "Gym" }))
        .send_request(&app)
        .await;
    assert_eq!(resp.status(), 404);
}
