mod support;

use axum::http::StatusCode;
use axum_test::multipart::MultipartForm;
use gallery_shared::Profile;
use support::{corrupt_png, image_part, location, png, register, TestApp, PASSWORD};

#[tokio::test]
async fn registration_provisions_a_profile_for_every_user() {
    let app = TestApp::new();
    let client = app.client();

    for username in ["alice", "bob", "carol"] {
        let response = register(&client, username).await;
        response.assert_status(StatusCode::FOUND);
        assert_eq!(location(&response), "/login/");

        let profile = app.store.profile_of(app.user_id(username));
        let profile = profile.expect("profile exists right after registration");
        assert_eq!(profile.avatar, Profile::DEFAULT_AVATAR);
    }

    // The success message is shown on the login page
    let page = client.get("/login/").await;
    page.assert_status_ok();
    assert!(page.text().contains("Your account has been created!"));
}

#[tokio::test]
async fn invalid_registration_rerenders_without_creating_user() {
    let app = TestApp::new();
    let client = app.client();

    let response = client
        .post("/register/")
        .form(&[
            ("username", "alice"),
            ("email", "alice@example.com"),
            ("password1", PASSWORD),
            ("password2", "something-else"),
        ])
        .await;

    response.assert_status_ok();
    assert!(response.text().contains("The two password fields"));
    assert_eq!(app.store.user_count(), 0);

    let short = client
        .post("/register/")
        .form(&[
            ("username", "alice"),
            ("email", "alice@example.com"),
            ("password1", "short"),
            ("password2", "short"),
        ])
        .await;

    short.assert_status_ok();
    assert!(short.text().contains("This password is too short"));
    assert_eq!(app.store.user_count(), 0);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = TestApp::new();
    let client = app.client();

    register(&client, "alice").await.assert_status(StatusCode::FOUND);

    let again = register(&client, "alice").await;
    again.assert_status_ok();
    assert!(again.text().contains("A user with that username already exists."));
    assert_eq!(app.store.user_count(), 1);
}

#[tokio::test]
async fn wrong_password_rerenders_login() {
    let app = TestApp::new();
    let client = app.client();
    register(&client, "alice").await;

    let response = client
        .post("/login/")
        .form(&[("username", "alice"), ("password", "not-the-password")])
        .await;

    response.assert_status_ok();
    assert!(response.text().contains("Please enter a correct username and password."));
    assert_eq!(app.store.active_sessions(app.user_id("alice")), 0);
}

#[tokio::test]
async fn anonymous_requests_are_sent_to_login_with_next() {
    let app = TestApp::new();
    let client = app.client();

    for path in ["/", "/upload/", "/profile/", "/categories/"] {
        let response = client.get(path).await;
        response.assert_status(StatusCode::FOUND);
        assert!(location(&response).starts_with("/login/?next="));
    }

    let response = client.get("/upload/").await;
    assert_eq!(location(&response), "/login/?next=%2Fupload%2F");
}

#[tokio::test]
async fn login_follows_next_only_within_site() {
    let app = TestApp::new();
    let client = app.client();
    register(&client, "alice").await;

    let response = client
        .post("/login/")
        .add_query_param("next", "/upload/")
        .form(&[("username", "alice"), ("password", PASSWORD)])
        .await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(location(&response), "/upload/");

    let response = client
        .post("/login/")
        .add_query_param("next", "https://evil.example/")
        .form(&[("username", "alice"), ("password", PASSWORD)])
        .await;
    assert_eq!(location(&response), "/");

    let response = client
        .post("/login/")
        .add_query_param("next", "/\t/evil.example")
        .form(&[("username", "alice"), ("password", PASSWORD)])
        .await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn logout_revokes_the_session() {
    let app = TestApp::new();
    let client = app.signed_in("alice").await;
    let user_id = app.user_id("alice");

    client.get("/").await.assert_status_ok();
    assert_eq!(app.store.active_sessions(user_id), 1);

    let response = client.post("/logout/").await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(location(&response), "/login/");
    assert_eq!(app.store.active_sessions(user_id), 0);

    let after = client.get("/").await;
    after.assert_status(StatusCode::FOUND);
    assert!(location(&after).starts_with("/login/"));
}

#[tokio::test]
async fn profile_page_restores_a_missing_profile() {
    let app = TestApp::new();
    let client = app.signed_in("alice").await;
    let user_id = app.user_id("alice");

    app.store.drop_profile(user_id);
    assert!(app.store.profile_of(user_id).is_none());

    client.get("/profile/").await.assert_status_ok();
    assert!(app.store.profile_of(user_id).is_some());
}

#[tokio::test]
async fn profile_update_changes_username_and_shrinks_avatar() {
    let app = TestApp::new();
    let client = app.signed_in("alice").await;
    let user_id = app.user_id("alice");

    let form = MultipartForm::new()
        .add_text("username", "alice2")
        .add_text("email", "alice2@example.com")
        .add_part("avatar", image_part(png(600, 400), "me.png"));

    let response = client.post("/profile/").multipart(form).await;
    response.assert_status(StatusCode::FOUND);
    assert_eq!(location(&response), "/profile/");

    let profile = app.store.profile_of(user_id).unwrap();
    assert!(profile.avatar.starts_with("avatars/"));
    let (width, height) = image::image_dimensions(app.media_path(&profile.avatar)).unwrap();
    assert_eq!((width, height), (300, 200));

    let page = client.get("/profile/").await;
    page.assert_status_ok();
    let body = page.text();
    assert!(body.contains("Your profile has been updated!"));
    assert!(body.contains("alice2@example.com"));

    let fresh = app.client();
    let response = fresh
        .post("/login/")
        .form(&[("username", "alice2"), ("password", PASSWORD)])
        .await;
    response.assert_status(StatusCode::FOUND);
}

#[tokio::test]
async fn undecodable_avatar_is_kept_and_profile_still_saved() {
    let app = TestApp::new();
    let client = app.signed_in("alice").await;
    let user_id = app.user_id("alice");

    let form = MultipartForm::new()
        .add_text("username", "alice")
        .add_text("email", "new@example.com")
        .add_part("avatar", image_part(corrupt_png(), "broken.png"));

    let response = client.post("/profile/").multipart(form).await;
    response.assert_status(StatusCode::FOUND);

    let profile = app.store.profile_of(user_id).unwrap();
    assert!(profile.has_custom_avatar());
    assert_eq!(
        std::fs::read(app.media_path(&profile.avatar)).unwrap(),
        corrupt_png()
    );
    assert_eq!(
        app.store.user_named("alice").unwrap().email,
        "new@example.com"
    );
}

#[tokio::test]
async fn profile_rejects_taken_username() {
    let app = TestApp::new();
    let client = app.signed_in("alice").await;
    register(&app.client(), "bob").await;

    let form = MultipartForm::new()
        .add_text("username", "bob")
        .add_text("email", "alice@example.com");

    let response = client.post("/profile/").multipart(form).await;
    response.assert_status_ok();
    assert!(response.text().contains("A user with that username already exists."));
    assert!(app.store.user_named("alice").is_some());
}
