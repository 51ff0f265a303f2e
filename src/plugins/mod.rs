pub mod admin_plugin;
pub mod bench_plugin;
pub mod export_plugin;
pub mod notice_plugin;
pub mod saved_plugin;
pub mod slot_ui_plugin;
pub mod stats_plugin;
pub mod storage_plugin;
pub mod viewer_plugin;
pub mod widgets;
