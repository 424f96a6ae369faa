fn main() -> anyhow::Result<()> {
    gistctx::cli::run()
}
