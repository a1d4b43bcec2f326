pub mod realtime;
pub mod supabase;

pub use realtime::{ChangeFeed, ChangeSignal, Table};
pub use supabase::SupabaseClient;
