pub mod button;
pub mod manual_copy;
pub mod modal;
pub mod toast;
