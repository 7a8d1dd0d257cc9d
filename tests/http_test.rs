use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use hi_academy::config::Config;
use hi_academy::server::create_server;
use hi_academy::storage::InMemoryStorage;
use hi_academy::web::auth::session_token;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    cookie: String,
    dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.storage.upload_root = dir.path().to_path_buf();
        config.admin.username = "owner".to_string();
        config.admin.password = "pw".to_string();
        config.admin.session_secret = "test-secret".to_string();

        let cookie = format!("admin-session={}", session_token("test-secret", "owner"));
        let router = create_server(Arc::new(InMemoryStorage::new()), config);
        Self { router, cookie, dir }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn admin_get(&self, uri: &str) -> Response {
        let request = Request::get(uri)
            .header(header::COOKIE, &self.cookie)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn json(&self, method: &str, uri: &str, body: Value, admin: bool) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if admin {
            builder = builder.header(header::COOKIE, &self.cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn form(&self, uri: &str, body: &str, admin: bool) -> Response {
        let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if admin {
            builder = builder.header(header::COOKIE, &self.cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    async fn create_course(&self, body: Value) -> Value {
        let response = self.json("POST", "/api/admin/courses", body, true).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        read_json(response).await
    }
}

async fn read_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn read_json(response: Response) -> Value {
    serde_json::from_str(&read_text(response).await).unwrap()
}

#[tokio::test]
async fn health_reports_service() {
    let app = TestApp::new();
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "hi-academy");
}

#[tokio::test]
async fn admin_pages_redirect_and_api_rejects_without_cookie() {
    let app = TestApp::new();

    for path in ["/admin", "/admin/courses", "/admin/registrations", "/admin/courses/1/lessons"] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(response.headers()[header::LOCATION], "/admin/login");
    }

    let response = app.get("/admin/login").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/registrations").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["error"], "Unauthorized");

    let response = app
        .json("POST", "/api/admin/courses", json!({ "title": "Revit" }), false)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.admin_get("/admin").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let app = TestApp::new();

    let response = app
        .json("POST", "/api/auth/login", json!({ "username": "owner", "password": "wrong" }), false)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["error"], "Invalid credentials");

    let response = app
        .json("POST", "/api/auth/login", json!({ "username": "owner", "password": "pw" }), false)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
    assert!(set_cookie.starts_with(&app.cookie));
    assert!(set_cookie.contains("HttpOnly"));

    let response = app
        .form("/admin/login", "username=owner&password=pw", false)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/admin");

    let response = app.form("/admin/logout", "", true).await;
    let cleared = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn created_course_is_served_by_slug() {
    let app = TestApp::new();
    let course = app
        .create_course(json!({
            "title": "Revit Complete Course",
            "price": 2500000,
            "level": "intermediate",
            "what_you_learn": "[\"walls\",\"roofs\"]"
        }))
        .await;
    assert_eq!(course["slug"], "revit-complete-course");
    assert_eq!(course["published"], false);
    assert!(app.dir.path().join("courses/revit-complete-course").is_dir());

    let response = app.get("/api/courses/revit-complete-course").await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = read_json(response).await;
    assert_eq!(detail["title"], "Revit Complete Course");
    assert_eq!(detail["what_you_learn"], json!(["walls", "roofs"]));
    assert_eq!(detail["lesson_count"], 0);

    // Unpublished courses stay out of the listing
    let listing = read_json(app.get("/api/courses").await).await;
    assert_eq!(listing.as_array().unwrap().len(), 0);

    let id = course["id"].as_i64().unwrap();
    let response = app
        .json("PUT", "/api/admin/courses", json!({ "id": id, "published": true }), true)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let listing = read_json(app.get("/api/courses?level=intermediate").await).await;
    assert_eq!(listing.as_array().unwrap().len(), 1);

    let response = app.get("/courses/revit-complete-course").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = read_text(response).await;
    assert!(html.contains("lang=\"fa\" dir=\"rtl\""));
    assert!(html.contains("۲٬۵۰۰٬۰۰۰ تومان"));
}

#[tokio::test]
async fn admin_course_errors_map_to_status_codes() {
    let app = TestApp::new();
    app.create_course(json!({ "title": "Revit" })).await;

    let response = app.json("POST", "/api/admin/courses", json!({ "title": "revit" }), true).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app.json("POST", "/api/admin/courses", json!({ "title": "" }), true).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.admin_get("/api/admin/courses/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "Invalid course id");

    let response = app.admin_get("/api/admin/courses/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.get("/api/courses/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["error"], "Course not found");

    let response = app.get("/courses/missing").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lessons_are_ordered_and_locked_lessons_hide_video() {
    let app = TestApp::new();
    let course = app.create_course(json!({ "title": "Revit", "published": true })).await;
    let course_id = course["id"].as_i64().unwrap();

    for (title, free) in [("Intro", true), ("Walls", false)] {
        let response = app
            .json(
                "POST",
                "/api/admin/lessons",
                json!({
                    "course_id": course_id,
                    "title": title,
                    "video_url": format!("/media/courses/revit/{}.mp4", title.to_lowercase()),
                    "is_free": free
                }),
                true,
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let lessons = read_json(app.admin_get(&format!("/api/admin/courses/{course_id}/lessons")).await).await;
    let order: Vec<i64> = lessons
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["order_index"].as_i64().unwrap())
        .collect();
    assert_eq!(order, vec![1, 2]);

    let free = read_text(app.get("/courses/revit/learn/intro").await).await;
    assert!(free.contains("intro.mp4"));
    assert!(free.contains("Walls"));

    let locked = app.get("/courses/revit/learn/walls").await;
    assert_eq!(locked.status(), StatusCode::OK);
    let locked = read_text(locked).await;
    assert!(!locked.contains("walls.mp4"));

    let response = app.get("/courses/revit/learn/roofs").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn registrations_flow_through_api_and_forms() {
    let app = TestApp::new();
    let course = app.create_course(json!({ "title": "Revit", "published": true })).await;
    let course_id = course["id"].as_i64().unwrap();

    let invalid = json!({
        "course_id": course_id,
        "full_name": "Sara",
        "email": "not-an-email",
        "phone": "09121234567"
    });
    let response = app.json("POST", "/api/registrations", invalid, false).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let missing = json!({
        "course_id": 999,
        "full_name": "Sara",
        "email": "sara@example.com",
        "phone": "09121234567"
    });
    let response = app.json("POST", "/api/registrations", missing, false).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let valid = json!({
        "course_id": course_id,
        "full_name": "Sara",
        "email": "sara@example.com",
        "phone": "09121234567"
    });
    let response = app.json("POST", "/api/registrations", valid, false).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let registration = read_json(response).await;
    assert_eq!(registration["status"], "pending");

    let response = app
        .form(
            "/courses/revit/enroll",
            "full_name=Reza&email=reza%40example.com&phone=0912+765+4321&message=",
            false,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .form("/courses/revit/enroll", "full_name=Reza&email=reza&phone=1", false)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let listed = read_json(app.admin_get("/api/registrations").await).await;
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["course"]["slug"], "revit");

    let id = registration["id"].as_i64().unwrap();
    let response = app
        .json("PUT", "/api/registrations", json!({ "id": id, "status": "enrolled" }), true)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "enrolled");

    let response = app
        .json("PUT", "/api/registrations", json!({ "id": id, "status": "archived" }), true)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .form(&format!("/admin/registrations/{id}/status"), "status=contacted", true)
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    // A course with registrations cannot be deleted
    let response = app
        .json("DELETE", &format!("/api/admin/courses?id={course_id}"), json!({}), true)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn deleting_course_removes_it_and_its_lessons() {
    let app = TestApp::new();
    let course = app.create_course(json!({ "title": "Lumion" })).await;
    let course_id = course["id"].as_i64().unwrap();
    let lesson = read_json(
        app.json("POST", "/api/admin/lessons", json!({ "course_id": course_id, "title": "Intro" }), true)
            .await,
    )
    .await;
    let lesson_id = lesson["id"].as_i64().unwrap();

    let response = app
        .json("DELETE", &format!("/api/admin/courses?id={course_id}"), json!({}), true)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/courses/lumion").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = app.admin_get(&format!("/api/admin/lessons/{lesson_id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .json("DELETE", &format!("/api/admin/courses?id={course_id}"), json!({}), true)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_stores_file_under_course_directory() {
    let app = TestApp::new();
    let boundary = "X-ACADEMY-BOUNDARY";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"courseSlug\"\r\n\r\n\
         revit\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"intro.mp4\"\r\n\
         Content-Type: video/mp4\r\n\r\n\
         fake-video\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::post("/api/upload")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .header(header::COOKIE, &app.cookie)
        .body(Body::from(body))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["url"], "/media/courses/revit/intro.mp4");

    let stored = std::fs::read(app.dir.path().join("courses/revit/intro.mp4")).unwrap();
    assert_eq!(stored, b"fake-video");

    let served = app.get("/media/courses/revit/intro.mp4").await;
    assert_eq!(served.status(), StatusCode::OK);
}

#[tokio::test]
async fn pwa_assets_are_served() {
    let app = TestApp::new();

    let response = app.get("/manifest.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let manifest = read_json(response).await;
    assert_eq!(manifest["dir"], "rtl");
    assert_eq!(manifest["lang"], "fa");

    let response = app.get("/service-worker.js").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/javascript");
}

#[tokio::test]
async fn public_pages_render() {
    let app = TestApp::new();
    for path in ["/", "/courses", "/courses?category=all&level=beginner&search=x", "/about", "/contact"] {
        let response = app.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "{path}");
        let html = read_text(response).await;
        assert!(html.contains("id=\"pwa-install\""), "{path}");
        assert!(html.contains("beforeinstallprompt"), "{path}");
    }
    assert_eq!(app.get("/nowhere").await.status(), StatusCode::NOT_FOUND);
}
