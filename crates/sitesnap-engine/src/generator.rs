// SPDX-FileCopyrightText: 2026 Sitesnap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request generation: catalog x site inventory -> ordered photo requests.
//!
//! The catalog's sheet order is the delivery order. Per-instance entries
//! consume matching inventory rows exactly once across the whole pass,
//! so a catalog that lists the same equipment name twice cannot request
//! the same physical instance twice. Per-site entries produce a single
//! occurrence keyed by the catalog name itself.

use sitesnap_core::{
    text, CatalogEntry, EquipmentScope, MetadataField, PhotoRequest, ReviewStatus, SiteEquipment,
};

/// Render the HTML caption delivered with one example image.
///
/// Escaping happens here, once, because the rendered prompt is
/// persisted with the request.
pub fn render_prompt(
    name: &str,
    metadata: &[MetadataField],
    caption: &str,
    index: u32,
) -> String {
    let mut prompt = text::bold(&text::escape_html(name));
    prompt.push('\n');
    let info: Vec<String> = metadata
        .iter()
        .map(|field| {
            format!(
                "{} {}",
                text::escape_html(&field.label),
                text::bold(&text::escape_html(&field.value))
            )
        })
        .collect();
    if !info.is_empty() {
        prompt.push_str(&info.join(", "));
        prompt.push('\n');
    }
    prompt.push_str(&text::number_caption(&text::escape_html(caption), index));
    prompt
}

fn push_requests(
    out: &mut Vec<PhotoRequest>,
    entry: &CatalogEntry,
    equipment_id: &str,
    index: u32,
    metadata: &[MetadataField],
) {
    for example in &entry.examples {
        out.push(PhotoRequest {
            id: PhotoRequest::new_id(),
            equipment_id: equipment_id.to_string(),
            name: entry.name.clone(),
            code: entry.code.clone(),
            index,
            prompt: render_prompt(&entry.name, metadata, &example.caption, index),
            example_url: example.image_url.clone(),
            status: ReviewStatus::Unknown,
        });
    }
}

/// Generate the full request list for one session.
///
/// Entries with an undefined scope or no examples contribute nothing.
pub fn generate_requests(
    catalog: &[CatalogEntry],
    site_equipment: &[SiteEquipment],
) -> Vec<PhotoRequest> {
    let mut requests = Vec::new();
    let mut consumed = vec![false; site_equipment.len()];

    for entry in catalog {
        if entry.examples.is_empty() {
            continue;
        }
        match entry.scope {
            EquipmentScope::Undefined => {}
            EquipmentScope::PerSite => {
                push_requests(&mut requests, entry, &entry.name, 1, &[]);
            }
            EquipmentScope::PerInstance => {
                let mut index = 0;
                for (i, equipment) in site_equipment.iter().enumerate() {
                    if consumed[i] || equipment.name != entry.name {
                        continue;
                    }
                    consumed[i] = true;
                    index += 1;
                    push_requests(&mut requests, entry, &equipment.id, index, &equipment.metadata);
                }
            }
        }
    }
    requests
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitesnap_core::ExamplePrompt;

    fn entry(name: &str, code: &str, scope: EquipmentScope, examples: usize) -> CatalogEntry {
        CatalogEntry {
            name: name.into(),
            code: code.into(),
            scope,
            examples: (0..examples)
                .map(|i| ExamplePrompt {
                    image_url: format!("https://drive.example.com/{code}/{i}.jpg"),
                    caption: format!("{name} shot #"),
                })
                .collect(),
        }
    }

    fn equipment(id: &str, name: &str) -> SiteEquipment {
        SiteEquipment {
            id: id.into(),
            name: name.into(),
            site: "316".into(),
            metadata: vec![MetadataField {
                label: "Serial number".into(),
                value: format!("SN-{id}"),
            }],
        }
    }

    #[test]
    fn per_instance_entry_expands_per_matching_instance() {
        let catalog = vec![entry("Pump", "PMP", EquipmentScope::PerInstance, 2)];
        let inventory = vec![equipment("inv-1", "Pump"), equipment("inv-2", "Pump")];

        let requests = generate_requests(&catalog, &inventory);
        assert_eq!(requests.len(), 4);
        assert_eq!(requests[0].equipment_id, "inv-1");
        assert_eq!(requests[0].index, 1);
        assert_eq!(requests[2].equipment_id, "inv-2");
        assert_eq!(requests[2].index, 2);
        // Occurrence index lands in the numbering placeholder.
        assert!(requests[2].prompt.ends_with("Pump shot #2"));
        assert!(requests[2].prompt.contains("Serial number <b>SN-inv-2</b>"));
    }

    #[test]
    fn per_site_entry_yields_one_occurrence_keyed_by_name() {
        let catalog = vec![entry("Fire panel", "FRP", EquipmentScope::PerSite, 1)];
        let requests = generate_requests(&catalog, &[]);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].equipment_id, "Fire panel");
        assert_eq!(requests[0].index, 1);
    }

    #[test]
    fn duplicate_catalog_names_never_reuse_an_instance() {
        let catalog = vec![
            entry("Pump", "PMP", EquipmentScope::PerInstance, 1),
            entry("Pump", "PM2", EquipmentScope::PerInstance, 1),
        ];
        let inventory = vec![equipment("inv-1", "Pump")];

        let requests = generate_requests(&catalog, &inventory);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].code, "PMP");
    }

    #[test]
    fn undefined_scope_and_exampleless_entries_are_skipped() {
        let catalog = vec![
            entry("Mystery", "MST", EquipmentScope::Undefined, 2),
            entry("Valve", "VLV", EquipmentScope::PerInstance, 0),
        ];
        let inventory = vec![equipment("inv-1", "Valve")];
        assert!(generate_requests(&catalog, &inventory).is_empty());
    }

    #[test]
    fn catalog_order_is_delivery_order() {
        let catalog = vec![
            entry("Pump", "PMP", EquipmentScope::PerInstance, 1),
            entry("Fire panel", "FRP", EquipmentScope::PerSite, 1),
        ];
        let inventory = vec![equipment("inv-1", "Pump")];
        let requests = generate_requests(&catalog, &inventory);
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].name, "Pump");
        assert_eq!(requests[1].name, "Fire panel");
    }

    #[test]
    fn prompt_escapes_html_in_sheet_values() {
        let prompt = render_prompt(
            "Pump <A&B>",
            &[MetadataField {
                label: "Type".into(),
                value: "a<b".into(),
            }],
            "shot #",
            1,
        );
        assert!(prompt.starts_with("<b>Pump &lt;A&amp;B&gt;</b>\n"));
        assert!(prompt.contains("Type <b>a&lt;b</b>"));
    }
}
