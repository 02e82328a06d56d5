fn main() {
    market_overview::cli::run();
}
