pub const GENEVIEW_DISPLAY_VERSION: &str = env!("GENEVIEW_DISPLAY_VERSION");
pub const GENEVIEW_BUILD_N: &str = env!("GENEVIEW_BUILD_N");

pub fn version_cli_text() -> String {
    format!(
        "geneview {}\nBuild {}\nDAS gene annotation track loader",
        GENEVIEW_DISPLAY_VERSION, GENEVIEW_BUILD_N
    )
}
