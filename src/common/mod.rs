pub mod image;
pub mod paths;
pub mod powershell;
pub mod win_app_id;
