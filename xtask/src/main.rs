/// The xtask binary delegates entirely to nih_plug_xtask, which provides
/// the `bundle` subcommand. Usage:
///
///   cargo xtask bundle loveless-fx --release
///
/// Both plugins live in the same library, so a single bundle command
/// produces `target/bundled/loveless-fx.vst3` and `loveless-fx.clap`
/// exposing the ambience and the dub delay.
fn main() -> nih_plug_xtask::Result<()> {
    nih_plug_xtask::main()
}
