//! Tables for `sis list` and `sis info`.

use comfy_table::presets::NOTHING;
use comfy_table::{Cell, ContentArrangement, Table};
use sis_core::ops::{ListEntry, PackageInfo};
use sis_schema::PackageId;

fn plain_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// One row per package: id, status and description.
pub fn package_list(entries: &[ListEntry]) -> Table {
    let mut table = plain_table();
    table.set_header(vec!["package", "status", "description"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.id.as_str()),
            Cell::new(entry.status()),
            Cell::new(entry.description.as_deref().unwrap_or("")),
        ]);
    }
    table
}

/// Key/value rows describing one package.
pub fn package_info(info: &PackageInfo) -> Table {
    let d = &info.descriptor;
    let mut rows: Vec<(&str, String)> = vec![("package", d.id.to_string())];
    if let Some(desc) = &d.description {
        rows.push(("description", desc.clone()));
    }
    if let Some(category) = &d.category {
        rows.push(("category", category.clone()));
    }
    if d.is_tool() {
        rows.push(("kind", "build tool".to_string()));
    }
    if let Some(license) = &d.license {
        let text = match &license.url {
            Some(url) => format!("{} <{url}>", license.name),
            None => license.name.clone(),
        };
        rows.push(("license", text));
    }
    if let Some(copyright) = &d.copyright {
        rows.push(("copyright", copyright.clone()));
    }
    if let Some(web) = &d.web {
        rows.push(("web", web.clone()));
    }
    if let Some(contact) = &d.contact {
        rows.push(("contact", contact.clone()));
    }
    if !d.requirements.is_empty() {
        rows.push(("requires", join(d.requirements.iter().map(PackageId::as_str))));
    }
    if info.requirements.len() > d.requirements.len() {
        rows.push(("all requires", join(info.requirements.iter().map(PackageId::as_str))));
    }
    if !d.uses.is_empty() {
        rows.push(("uses", join(d.uses.iter().map(PackageId::as_str))));
    }
    let installed = info.installed.as_ref().map_or_else(
        || "no".to_string(),
        |state| format!("{} ({})", state.version, state.mode.as_str()),
    );
    rows.push(("installed", installed));
    if !info.binaries.is_empty() {
        let versions = info.binaries.iter().map(|(version, size)| match size {
            Some(size) => format!("{version} ({size} bytes)"),
            None => version.to_string(),
        });
        rows.push(("binaries", versions.collect::<Vec<_>>().join(", ")));
    }
    rows.push(("source", if info.buildable { "yes" } else { "no" }.to_string()));

    let mut table = plain_table();
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(value)]);
    }
    table
}

fn join<'a>(items: impl Iterator<Item = &'a str>) -> String {
    items.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sis_schema::VersionTag;

    #[test]
    fn test_list_rows() {
        let entries = vec![ListEntry {
            id: PackageId::new("gel"),
            description: Some("GEL library".to_string()),
            installed: None,
            available: Some(VersionTag::new("1.1")),
            buildable: false,
        }];
        let text = package_list(&entries).to_string();
        assert!(text.contains("gel"));
        assert!(text.contains("not installed (avail. 1.1)"));
        assert!(text.contains("GEL library"));
    }
}
