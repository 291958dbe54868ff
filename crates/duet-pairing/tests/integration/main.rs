mod helpers;

mod generate_test;
mod redeem_test;
mod watch_test;
