fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    // Run the pathway editor
    pathway_tool::run_app()
}
