/// Markers for the human-readable output
pub struct Icons;

impl Icons {
    pub const MIGRATE: &str = "🚚";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    /// Foreign key pointing at a missing parent
    pub const LINK: &str = "🔗";
    pub const DATABASE: &str = "🗄️";
    /// Stage that skipped records
    pub const SKIP: &str = "⏭️";
}
