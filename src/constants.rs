// Server configuration
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: &str = "8000";
pub const DEFAULT_DATA_PATH: &str = "data";
pub const DATABASE_FILE_NAME: &str = "budget.db";
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:5174",
    "http://127.0.0.1:5174",
];
pub const DEFAULT_LOG_FILTER: &str = "budget_tracker_server=debug,tower_http=info";

// Service metadata
pub const SERVICE_NAME: &str = "Budget Tracker 2025 API";
pub const SERVICE_VERSION: &str = "1.0.0";

// Database limits and defaults
pub const DEFAULT_LIST_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;
pub const MAX_OFFSET: u32 = 1_000_000;
pub const EXPORT_ROW_LIMIT: u32 = 10_000;

// Validation limits
pub const MAX_USER_NAME_LENGTH: usize = 100;
pub const MAX_CATEGORY_NAME_LENGTH: usize = 50;
pub const MAX_DESCRIPTION_LENGTH: usize = 200;

// Display defaults
pub const DEFAULT_COLOR: &str = "#667eea";
pub const DEFAULT_USER_NAME: &str = "You";
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("Food", "#ff6b6b"),
    ("Transportation", "#4ecdc4"),
    ("Utilities", "#45b7d1"),
    ("Entertainment", "#96ceb4"),
    ("Shopping", "#ffeaa7"),
    ("Healthcare", "#dda0dd"),
    ("Education", "#fab1a0"),
    ("Travel", "#74b9ff"),
    ("Insurance", "#a29bfe"),
    ("Other", "#636e72"),
];

// Summary
pub const DAILY_AVERAGE_DIVISOR: f64 = 30.0;

// Import columns
pub const REQUIRED_IMPORT_COLUMNS: [&str; 4] = ["date", "amount", "category", "user"];
pub const EXPORT_HEADER: [&str; 5] = ["date", "amount", "category", "description", "user"];

// Error messages
pub const ERR_DATABASE_OPERATION: &str = "Database operation failed";
pub const ERR_MISSING_COLUMNS: &str = "Missing required columns: date, amount, category, user";
pub const ERR_INVALID_DATE: &str = "Invalid date format. Expected YYYY-MM-DD";
pub const ERR_INVALID_AMOUNT: &str = "Invalid amount. Must be a positive number";
pub const ERR_EMPTY_USER_NAME: &str = "User name cannot be empty";
