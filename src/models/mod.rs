pub mod user;

#[allow(unused_imports)]
pub mod prelude {
    pub use super::user::{self, Entity as User};
}
