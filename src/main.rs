use anyhow::Result;

fn main() -> Result<()> {
    let args = synclink::cli::parse();
    synclink::app::run(args)
}
