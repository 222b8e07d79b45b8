fn main() -> anyhow::Result<()> {
    combat_ledger_analyzer::run()
}
