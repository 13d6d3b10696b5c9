//! PDF pagination via lopdf
//!
//! Opening parses the page tree once and records each page's size. A page
//! render copies just that page's object graph into a fresh single-page PDF,
//! so the cost of a render follows the page, not the whole document.

use std::sync::Arc;

use async_trait::async_trait;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use super::cache::PageCacheKey;
use super::error::{RenderError, RenderResult};
use super::{PageRenderer, PageSize, RenderEngine, RenderedPage};

/// Guard against malformed (cyclic) page trees
const MAX_TREE_DEPTH: usize = 32;

/// How far into the buffer the `%PDF-` header may appear
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Page attributes that may be set on an ancestor instead of the page
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Parsed page tree, produced on the blocking pool
pub(super) struct ParsedPdf {
    doc: Document,
    page_ids: Vec<ObjectId>,
    sizes: Vec<PageSize>,
}

/// An opened PDF ready for page rendering
pub struct PdfPages {
    digest: String,
    doc: Arc<Document>,
    page_ids: Vec<ObjectId>,
    sizes: Vec<PageSize>,
    engine: RenderEngine,
}

impl PdfPages {
    pub(super) fn new(digest: String, parsed: ParsedPdf, engine: RenderEngine) -> Self {
        Self {
            digest,
            doc: Arc::new(parsed.doc),
            page_ids: parsed.page_ids,
            sizes: parsed.sizes,
            engine,
        }
    }

    /// Content digest the pages are cached under
    pub fn digest(&self) -> &str {
        &self.digest
    }

    fn check_page(&self, page: usize) -> RenderResult<()> {
        if page == 0 || page > self.sizes.len() {
            return Err(RenderError::PageOutOfRange {
                page,
                page_count: self.sizes.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PageRenderer for PdfPages {
    fn page_count(&self) -> usize {
        self.sizes.len()
    }

    fn page_size(&self, page: usize) -> RenderResult<PageSize> {
        self.check_page(page)?;
        Ok(self.sizes[page - 1])
    }

    async fn render_page(&self, page: usize) -> RenderResult<Arc<RenderedPage>> {
        let size = self.page_size(page)?;

        let key = PageCacheKey::new(&self.digest, page);
        if let Some(hit) = self.engine.pages.get(&key) {
            return Ok(hit);
        }

        let doc = Arc::clone(&self.doc);
        let page_id = self.page_ids[page - 1];
        let data = self
            .engine
            .run_blocking(move || extract_page(&doc, page_id, page))
            .await?;

        let rendered = Arc::new(RenderedPage {
            number: page,
            width: size.width,
            height: size.height,
            data: Arc::new(data),
        });
        self.engine.pages.put(key, Arc::clone(&rendered));

        tracing::debug!(
            "Rendered page {}/{} of {} ({} bytes)",
            page,
            self.page_count(),
            &self.digest[..12.min(self.digest.len())],
            rendered.data.len()
        );
        Ok(rendered)
    }
}

/// Parse bytes into a page tree (blocking)
pub(super) fn parse(bytes: &[u8]) -> RenderResult<ParsedPdf> {
    let window = &bytes[..bytes.len().min(HEADER_SEARCH_WINDOW)];
    if !window.windows(5).any(|w| w == b"%PDF-") {
        return Err(RenderError::Unreadable("missing %PDF header".to_string()));
    }

    let doc = Document::load_mem(bytes)?;
    if doc.trailer.get(b"Encrypt").is_ok() {
        return Err(RenderError::Encrypted);
    }

    let pages = doc.get_pages();
    if pages.is_empty() {
        return Err(RenderError::NoPages);
    }

    let page_ids: Vec<ObjectId> = pages.values().copied().collect();
    let sizes = page_ids.iter().map(|id| page_size(&doc, *id)).collect();
    Ok(ParsedPdf {
        doc,
        page_ids,
        sizes,
    })
}

/// Extract one page (1-indexed) as a standalone PDF (blocking)
///
/// Copies the page with everything it references, stopping at other page
/// tree nodes. Links into other pages are left dangling.
pub(super) fn extract_page(
    doc: &Document,
    page_id: ObjectId,
    page: usize,
) -> RenderResult<Vec<u8>> {
    let failed = |message: String| RenderError::PageExtraction { page, message };

    let mut page_dict = doc
        .get_dictionary(page_id)
        .map_err(|e| failed(e.to_string()))?
        .clone();
    for key in INHERITABLE {
        if !page_dict.has(key) {
            if let Some(value) = inherited(doc, &page_dict, key) {
                page_dict.set(key, value);
            }
        }
    }
    page_dict.remove(b"Parent");

    let mut single = Document::with_version(doc.version.clone());
    single.max_id = doc.max_id;
    let pages_id = single.new_object_id();

    let mut pending: Vec<ObjectId> = page_dict.iter().flat_map(|(_, v)| references(v)).collect();
    while let Some(id) = pending.pop() {
        if id == page_id || single.objects.contains_key(&id) {
            continue;
        }
        let Ok(object) = doc.get_object(id) else {
            continue;
        };
        if is_page_node(object) {
            continue;
        }
        pending.extend(references(object));
        single.objects.insert(id, object.clone());
    }

    page_dict.set("Parent", pages_id);
    single.objects.insert(page_id, Object::Dictionary(page_dict));
    single.objects.insert(
        pages_id,
        dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => 1_i64,
        }
        .into(),
    );
    let catalog_id = single.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    single.trailer.set("Root", catalog_id);

    let mut data = Vec::new();
    single
        .save_to(&mut data)
        .map_err(|e| failed(e.to_string()))?;
    Ok(data)
}

/// Nearest ancestor's value for an inheritable attribute
fn inherited(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut node = page.get(b"Parent").and_then(Object::as_reference).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = doc.get_dictionary(node).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        node = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

/// Every indirect reference held inside `object`
fn references(object: &Object) -> Vec<ObjectId> {
    let mut found = Vec::new();
    let mut stack = vec![object];
    while let Some(object) = stack.pop() {
        match object {
            Object::Reference(id) => found.push(*id),
            Object::Array(items) => stack.extend(items.iter()),
            Object::Dictionary(dict) => stack.extend(dict.iter().map(|(_, v)| v)),
            Object::Stream(stream) => stack.extend(stream.dict.iter().map(|(_, v)| v)),
            _ => {}
        }
    }
    found
}

fn is_page_node(object: &Object) -> bool {
    object
        .as_dict()
        .and_then(|dict| dict.get(b"Type"))
        .and_then(Object::as_name)
        .is_ok_and(|name| matches!(name, b"Page" | b"Pages"))
}

/// MediaBox size of a page, following inheritance up the page tree
fn page_size(doc: &Document, page_id: ObjectId) -> PageSize {
    let mut node = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let Ok(dict) = doc.get_dictionary(node) else {
            break;
        };
        let media_box = dict.get(b"MediaBox").ok();
        if let Some(size) = media_box.and_then(|obj| media_box_size(doc, obj)) {
            return size;
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => node = parent,
            Err(_) => break,
        }
    }
    PageSize::LETTER
}

fn media_box_size(doc: &Document, obj: &Object) -> Option<PageSize> {
    let (_, obj) = doc.dereference(obj).ok()?;
    let rect = obj.as_array().ok()?;
    if rect.len() != 4 {
        return None;
    }

    let coords: Vec<f32> = rect
        .iter()
        .map(|o| doc.dereference(o).ok().and_then(|(_, o)| o.as_float().ok()))
        .collect::<Option<_>>()?;

    Some(PageSize {
        width: (coords[2] - coords[0]).abs(),
        height: (coords[3] - coords[1]).abs(),
    })
}
