mod show;
mod subscriber_email;
// allow external `use` statements to skip `show` etc
pub use show::start_of_today;
pub use show::Show;
pub use subscriber_email::SubscriberEmail;
