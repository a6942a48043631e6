//! ZIP bundles of generated documents.

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::ArchiveResult;
use crate::transform::encoder::{ArtifactKind, Artifacts};

/// Bundle name for decoded tables.
pub const TABLE_BUNDLE_NAME: &str = "dados_consolidados_tiss5.csv";

/// Bundle name for decoded tables as a workbook.
pub const SPREADSHEET_BUNDLE_NAME: &str = "dados_consolidados_tiss5.xlsx";

/// Bundle name for one artifact kind.
pub fn bundle_name(kind: ArtifactKind) -> &'static str {
    match kind {
        ArtifactKind::Xml => "arquivos_xml_tiss5.zip",
        ArtifactKind::Xte => "arquivos_xte_tiss5.zip",
    }
}

/// Zip every artifact of `kind` into one deflated archive, in name order.
pub fn bundle(artifacts: &Artifacts, kind: ArtifactKind) -> ArchiveResult<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in artifacts.of_kind(kind) {
        zip.start_file(name, options)?;
        zip.write_all(bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn artifacts() -> Artifacts {
        let mut artifacts = Artifacts::default();
        for name in ["a.xml", "a.xte", "b.xml", "b.xte"] {
            artifacts
                .files
                .insert(name.to_string(), format!("<{name}/>").into_bytes());
        }
        artifacts.documents = 2;
        artifacts
    }

    #[test]
    fn test_bundle_holds_one_kind() {
        let bytes = bundle(&artifacts(), ArtifactKind::Xte).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        assert_eq!(archive.len(), 2);
        let names: Vec<String> = archive.file_names().map(String::from).collect();
        assert!(names.contains(&"a.xte".to_string()));
        assert!(names.contains(&"b.xte".to_string()));

        let mut content = String::new();
        archive
            .by_name("b.xte")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<b.xte/>");
    }

    #[test]
    fn test_empty_bundle_is_valid_zip() {
        let bytes = bundle(&Artifacts::default(), ArtifactKind::Xml).unwrap();
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_bundle_names() {
        assert_eq!(bundle_name(ArtifactKind::Xml), "arquivos_xml_tiss5.zip");
        assert_eq!(bundle_name(ArtifactKind::Xte), "arquivos_xte_tiss5.zip");
    }
}
