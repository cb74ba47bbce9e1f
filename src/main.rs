fn main() -> anyhow::Result<()> {
    bannercanvas::run()
}
