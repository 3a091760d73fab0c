fn main() {
    snipt_cli::run_main();
}
