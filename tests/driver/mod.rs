mod channel_test;
mod controller_test;
mod process_test;
