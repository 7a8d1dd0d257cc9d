/// Names shared by the web layer, storage and the CLI

pub const SERVICE_NAME: &str = "hi-academy";

// Admin session cookie
pub const ADMIN_COOKIE: &str = "admin-session";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";

// Upload layout: files live under <upload_root>/courses/<slug>/ and are
// served from /media/courses/<slug>/
pub const COURSES_DIR: &str = "courses";
pub const MEDIA_URL_PREFIX: &str = "/media";

// Number of courses shown on the home page and the admin dashboard
pub const FEATURED_COURSES: usize = 3;
pub const RECENT_COURSES: usize = 3;

// Category filter value that disables filtering
pub const ALL_CATEGORIES: &str = "all";

// Default locations used when neither config.toml nor the environment says otherwise
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_DATABASE_PATH: &str = "data/academy.db";
pub const DEFAULT_UPLOAD_ROOT: &str = "public";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 512 * 1024 * 1024;
