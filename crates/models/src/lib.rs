pub mod errors;
pub mod db;
pub mod contact;
pub mod conversation;

#[cfg(test)]
mod tests;
