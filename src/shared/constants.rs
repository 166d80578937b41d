/// Separator placed between names in a rendered category path
pub const CATEGORY_PATH_SEPARATOR: &str = " > ";

// =============================================================================
// REQUEST HEADERS
// =============================================================================

/// Header through which the calling layer passes the owner identity
pub const OWNER_ID_HEADER: &str = "x-owner-id";
