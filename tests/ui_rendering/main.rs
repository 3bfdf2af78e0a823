mod chat_flow_test;
mod common;
mod directory_test;
mod scroll_test;
