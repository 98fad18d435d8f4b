use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    pilgrim_analytics::example_apps::run_basic_usage(std::env::args().skip(1))
}
