// Integration tests for pdfattach.
//
// Real PDF inputs are constructed in memory with lopdf instead of shipping
// binary fixtures, so the whole pipeline (open → authenticate → enumerate →
// classify → decode/store) runs against genuine documents. Tests that need a
// password-protected fixture are marked `#[ignore]` so CI passes without one.

use encoding_rs::UTF_8;
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use pdfattach::{
    AttachmentExtractor, AttachmentOutcome, DirStore, ExtractError, ExtractorConfig, MemoryStore,
    ArtifactStore, DocumentSession,
};

// ── Fixture construction ──────────────────────────────────────────────────────

/// Build a single-page PDF whose `/Names/EmbeddedFiles` tree holds the given
/// `(filename, payload)` attachments, in order.
fn pdf_with_attachments(attachments: &[(&str, &[u8])]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let mut names: Vec<Object> = Vec::new();
    for (name, data) in attachments {
        let stream_id = doc.add_object(Stream::new(
            dictionary! { "Type" => "EmbeddedFile" },
            data.to_vec(),
        ));
        let spec_id = doc.add_object(dictionary! {
            "Type" => "Filespec",
            "F" => Object::String(name.as_bytes().to_vec(), StringFormat::Literal),
            "EF" => dictionary! { "F" => Object::Reference(stream_id) },
        });
        names.push(Object::String(
            name.as_bytes().to_vec(),
            StringFormat::Literal,
        ));
        names.push(Object::Reference(spec_id));
    }

    let tree_id = doc.add_object(dictionary! { "Names" => names });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "Names" => dictionary! { "EmbeddedFiles" => Object::Reference(tree_id) },
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("failed to serialise test PDF");
    out
}

// ── Terminal failures ─────────────────────────────────────────────────────────

#[test]
fn garbage_input_is_malformed() {
    let store = MemoryStore::new();
    let result = AttachmentExtractor::new().extract(b"not a pdf", None, &store);
    assert!(matches!(result, Err(ExtractError::MalformedDocument(_))));
}

#[test]
fn empty_input_is_malformed() {
    let store = MemoryStore::new();
    let result = AttachmentExtractor::new().extract(&[], None, &store);
    assert!(matches!(result, Err(ExtractError::MalformedDocument(_))));
}

#[test]
fn document_without_attachments_is_terminal_and_stores_nothing() {
    let bytes = pdf_with_attachments(&[]);
    let store = MemoryStore::new();

    let result = AttachmentExtractor::new().extract(&bytes, None, &store);

    assert!(matches!(result, Err(ExtractError::NoAttachments)));
    assert!(store.is_empty());
}

// ── Session contract ──────────────────────────────────────────────────────────

#[test]
fn enumeration_requires_authentication() {
    let bytes = pdf_with_attachments(&[("note.html", b"<p>hi</p>")]);
    let session = DocumentSession::open(&bytes).unwrap();

    assert!(!session.is_authenticated());
    assert!(matches!(
        session.enumerate_attachments(),
        Err(ExtractError::NotAuthenticated)
    ));
}

#[test]
fn unprotected_document_authenticates_without_password() {
    let bytes = pdf_with_attachments(&[("note.html", b"<p>hi</p>")]);
    let mut session = DocumentSession::open(&bytes).unwrap();

    assert!(!session.requires_password());
    assert!(session.authenticate(None));
    assert!(session.is_authenticated());

    let attachments = session.enumerate_attachments().unwrap();
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].index, 0);
    assert_eq!(attachments[0].name, "note.html");
    assert_eq!(attachments[0].data, b"<p>hi</p>");

    session.close();
}

// ── End-to-end extraction ─────────────────────────────────────────────────────

#[test]
fn text_and_nested_pdf_extract_in_table_order() {
    let bytes = pdf_with_attachments(&[
        ("note.html", "café".as_bytes()),
        ("inner.pdf", b"%PDF-1.4 truncated nested document"),
    ]);
    let store = MemoryStore::new();

    let outcomes = AttachmentExtractor::new()
        .extract(&bytes, None, &store)
        .unwrap();

    assert_eq!(
        outcomes,
        vec![
            AttachmentOutcome::Text {
                content: "café".into()
            },
            AttachmentOutcome::Artifact {
                name: "attachment_1.pdf".into()
            },
        ]
    );

    // The artifact is retrievable exactly once, byte-for-byte.
    let data = store.take("attachment_1.pdf").unwrap();
    assert_eq!(data, b"%PDF-1.4 truncated nested document");
    assert!(matches!(
        store.take("attachment_1.pdf"),
        Err(ExtractError::ArtifactNotFound(_))
    ));
}

#[test]
fn ordering_is_preserved_across_mixed_kinds() {
    let bytes = pdf_with_attachments(&[
        ("a.txt", b"first"),
        ("b.pdf", b"%PDF-1.7"),
        ("c.txt", b"third"),
    ]);
    let store = MemoryStore::new();

    let outcomes = AttachmentExtractor::new()
        .extract(&bytes, None, &store)
        .unwrap();

    assert_eq!(outcomes.len(), 3);
    assert_eq!(
        outcomes[0],
        AttachmentOutcome::Text {
            content: "first".into()
        }
    );
    // Artifact name derives from the entry's table index, not from how many
    // artifacts precede it.
    assert_eq!(outcomes[1].artifact_name(), Some("attachment_1.pdf"));
    assert_eq!(
        outcomes[2],
        AttachmentOutcome::Text {
            content: "third".into()
        }
    );
}

#[test]
fn legacy_codepage_attachment_decodes() {
    // 0xB3 0xF3 0x64 0xBC is invalid UTF-8 but spells "łódź" in ISO-8859-2.
    let bytes = pdf_with_attachments(&[("city.txt", &[0xB3, 0xF3, 0x64, 0xBC])]);
    let store = MemoryStore::new();

    let outcomes = AttachmentExtractor::new()
        .extract(&bytes, None, &store)
        .unwrap();

    assert_eq!(
        outcomes,
        vec![AttachmentOutcome::Text {
            content: "łódź".into()
        }]
    );
}

#[test]
fn undecodable_entry_does_not_abort_siblings() {
    let bytes = pdf_with_attachments(&[
        ("binary.dat", &[0xFF, 0xFE, 0x00, 0x01]),
        ("ok.txt", b"still here"),
    ]);
    let store = MemoryStore::new();

    // Restrict decoding to UTF-8 so the first payload is genuinely
    // undecodable instead of falling through to a legacy codepage.
    let extractor = AttachmentExtractor::with_config(ExtractorConfig {
        encodings: vec![UTF_8],
        ..Default::default()
    });
    let outcomes = extractor.extract(&bytes, None, &store).unwrap();

    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].is_error());
    assert_eq!(
        outcomes[1],
        AttachmentOutcome::Text {
            content: "still here".into()
        }
    );
}

#[test]
fn pdf_signature_wins_over_decodability() {
    // Valid UTF-8 all the way through, but the signature verdict is final.
    let bytes = pdf_with_attachments(&[("odd.txt", b"%PDF looks like text")]);
    let store = MemoryStore::new();

    let outcomes = AttachmentExtractor::new()
        .extract(&bytes, None, &store)
        .unwrap();

    assert_eq!(outcomes[0].artifact_name(), Some("attachment_0.pdf"));
    assert_eq!(store.take("attachment_0.pdf").unwrap(), b"%PDF looks like text");
}

#[test]
fn oversize_attachment_is_a_per_entry_error() {
    let bytes = pdf_with_attachments(&[
        ("big.txt", b"0123456789 way past the cap"),
        ("small.txt", b"ok"),
    ]);
    let store = MemoryStore::new();

    let extractor = AttachmentExtractor::with_config(ExtractorConfig {
        max_attachment_size: Some(8),
        ..Default::default()
    });
    let outcomes = extractor.extract(&bytes, None, &store).unwrap();

    assert!(outcomes[0].is_error());
    assert_eq!(
        outcomes[1],
        AttachmentOutcome::Text {
            content: "ok".into()
        }
    );
}

#[test]
fn store_collision_is_a_per_entry_error() {
    let bytes = pdf_with_attachments(&[("inner.pdf", b"%PDF-1.4")]);
    let store = MemoryStore::new();
    let extractor = AttachmentExtractor::new();

    let first = extractor.extract(&bytes, None, &store).unwrap();
    assert_eq!(first[0].artifact_name(), Some("attachment_0.pdf"));

    // Same document, same store: the derived name is already occupied, so
    // the second run records a per-entry error instead of overwriting.
    let second = extractor.extract(&bytes, None, &store).unwrap();
    assert!(second[0].is_error());
    assert_eq!(store.take("attachment_0.pdf").unwrap(), b"%PDF-1.4");
}

// ── Directory-backed store ────────────────────────────────────────────────────

#[test]
fn dir_store_roundtrip_and_single_take() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::open(dir.path()).unwrap();

    let name = store.put(2, b"nested pdf bytes").unwrap();
    assert_eq!(name, "attachment_2.pdf");
    assert!(dir.path().join(&name).exists());

    assert_eq!(store.take(&name).unwrap(), b"nested pdf bytes");
    assert!(!dir.path().join(&name).exists());
    assert!(matches!(
        store.take(&name),
        Err(ExtractError::ArtifactNotFound(_))
    ));
}

#[test]
fn dir_store_refuses_collision() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::open(dir.path()).unwrap();

    store.put(0, b"first").unwrap();
    assert!(matches!(
        store.put(0, b"second"),
        Err(ExtractError::ArtifactNameCollision(_))
    ));
    assert_eq!(store.take("attachment_0.pdf").unwrap(), b"first");
}

#[test]
fn dir_store_rejects_traversal_names() {
    let dir = tempfile::tempdir().unwrap();
    let outside = dir.path().join("secret.txt");
    std::fs::write(&outside, b"do not serve").unwrap();

    let store = DirStore::open(dir.path().join("artifacts")).unwrap();
    assert!(matches!(
        store.take("../secret.txt"),
        Err(ExtractError::ArtifactNotFound(_))
    ));
    assert!(outside.exists());
}

#[test]
fn extraction_works_against_a_dir_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = DirStore::open(dir.path()).unwrap();
    let bytes = pdf_with_attachments(&[("inner.pdf", b"%PDF-1.6 payload")]);

    let outcomes = AttachmentExtractor::new()
        .extract(&bytes, None, &store)
        .unwrap();

    assert_eq!(outcomes[0].artifact_name(), Some("attachment_0.pdf"));
    assert_eq!(store.take("attachment_0.pdf").unwrap(), b"%PDF-1.6 payload");
}

// ── Fixture-based tests (ignored without real PDFs) ───────────────────────────

/// To run: place a password-protected PDF (password "secret") with at least
/// one attachment at `tests/fixtures/protected.pdf` and run with
/// `--include-ignored`.
#[test]
#[ignore]
fn fixture_protected_pdf_rejects_wrong_password() {
    let bytes = std::fs::read("tests/fixtures/protected.pdf")
        .expect("place tests/fixtures/protected.pdf to run this test");
    let store = MemoryStore::new();
    let extractor = AttachmentExtractor::new();

    assert!(matches!(
        extractor.extract(&bytes, None, &store),
        Err(ExtractError::IncorrectPassword)
    ));
    assert!(matches!(
        extractor.extract(&bytes, Some("wrong"), &store),
        Err(ExtractError::IncorrectPassword)
    ));
}

#[test]
#[ignore]
fn fixture_protected_pdf_extracts_with_correct_password() {
    let bytes = std::fs::read("tests/fixtures/protected.pdf")
        .expect("place tests/fixtures/protected.pdf to run this test");
    let store = MemoryStore::new();

    let outcomes = AttachmentExtractor::new()
        .extract(&bytes, Some("secret"), &store)
        .unwrap();
    assert!(!outcomes.is_empty());
}
