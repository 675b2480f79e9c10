pub mod test_fixtures;
