pub mod highlight;
pub mod layout;
pub mod renderer;
pub mod request_detail;
pub mod request_list;
pub mod response_detail;
pub mod status_bar;
