



// Engine tests
mod engine_tests;
