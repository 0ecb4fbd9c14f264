fn main() {
    ameise_tools::console::init();
    if let Err(err) = ameise_tools::fill::run(std::env::args_os()) {
        eprintln!("error while filling the template: {err:#}");
        std::process::exit(1);
    }
}
