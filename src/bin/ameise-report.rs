fn main() {
    ameise_tools::console::init();
    if let Err(err) = ameise_tools::report::run(std::env::args_os()) {
        eprintln!("error while building the report: {err:#}");
        std::process::exit(1);
    }
}
