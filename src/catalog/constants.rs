pub const DEFAULT_SCHEMA: &str = "public";
