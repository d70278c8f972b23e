mod common;

use std::sync::Arc;

use futures::executor::block_on;
use webdesk_core::fs::archive;
use webdesk_core::fs::shortcut::{self, ShortcutKind};
use webdesk_core::fs::SortReconciliation;
use webdesk_core::{
    ArchiveEntry, ArchiveKind, FolderOptions, FolderPhase, FolderSync, FsError, PathStore, SortBy,
    SortOrderStore,
};

use common::{GatedStore, harness, harness_with};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

#[test]
fn refresh_lists_store_contents_without_system_files() {
    let h = harness();
    h.store.seed_file("/home/notes.txt", "n").unwrap();
    h.store.seed_file("/home/desktop.ini", "[.ShellClassInfo]").unwrap();
    h.store.seed_dir("/home/music").unwrap();

    let view = FolderSync::new("/home", h.ctx.clone(), FolderOptions::default());
    assert_eq!(view.phase(), FolderPhase::Uninitialized);
    block_on(view.sync()).unwrap();

    assert_eq!(view.phase(), FolderPhase::Ready);
    assert_eq!(view.names(), names(&["music", "notes.txt"]));
    assert_eq!(h.sort_orders.get("/home"), Some(names(&["music", "notes.txt"])));
    assert_eq!(h.host.listings.lock().last().map(|(dir, _)| dir.clone()), Some("/home".into()));
}

#[test]
fn hide_folders_leaves_directories_out() {
    let h = harness();
    h.store.seed_file("/d/a.txt", "a").unwrap();
    h.store.seed_dir("/d/sub").unwrap();

    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions { hide_folders: true });
    block_on(view.sync()).unwrap();
    assert_eq!(view.names(), names(&["a.txt"]));
}

#[test]
fn rename_keeps_the_entry_in_place() {
    let h = harness();
    h.store.seed_file("/d/alpha.txt", "a").unwrap();
    h.store.seed_file("/d/beta.txt", "b").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());
    block_on(view.sync()).unwrap();

    let renamed = block_on(view.rename("/d/alpha.txt", "gamma.txt")).unwrap();
    assert_eq!(renamed.as_deref(), Some("/d/gamma.txt"));
    assert_eq!(block_on(view.process_pending_changes()).unwrap(), 1);

    assert_eq!(view.names(), names(&["gamma.txt", "beta.txt"]));
    assert_eq!(h.sort_orders.get("/d"), Some(names(&["gamma.txt", "beta.txt"])));
}

#[test]
fn rename_refuses_taken_or_empty_names() {
    let h = harness();
    h.store.seed_file("/d/a.txt", "a").unwrap();
    h.store.seed_file("/d/b.txt", "b").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    assert_eq!(block_on(view.rename("/d/a.txt", "b.txt")).unwrap(), None);
    assert_eq!(block_on(view.rename("/d/a.txt", "  ")).unwrap(), None);
    assert!(block_on(h.store.exists("/d/a.txt")).unwrap());
}

#[test]
fn renaming_a_shortcut_keeps_its_extension() {
    let h = harness();
    h.store.seed_file("/d/link.url", "[InternetShortcut]\nURL=/\n").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    let renamed = block_on(view.rename("/d/link.url", "home")).unwrap();
    assert_eq!(renamed.as_deref(), Some("/d/home.url"));
}

#[test]
fn archive_then_extract_reproduces_the_tree() {
    let h = harness();
    h.store.seed_file("/d/a.txt", "hi").unwrap();
    h.store.seed_file("/d/dir/b.txt", "yo").unwrap();
    h.store.seed_dir("/d/empty").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    let paths = names(&["/d/a.txt", "/d/dir", "/d/empty"]);
    let name = block_on(view.archive(&paths)).unwrap();
    assert_eq!(name, "d.zip");

    let bytes = block_on(h.store.read("/d/d.zip")).unwrap();
    let mut members: Vec<String> = archive::decompress(&bytes, ArchiveKind::Zip)
        .unwrap()
        .into_iter()
        .map(|entry| entry.path)
        .collect();
    members.sort();
    assert_eq!(members, names(&["a.txt", "dir/b.txt", "empty/"]));

    let extracted = block_on(view.extract("/d/d.zip")).unwrap();
    assert_eq!(extracted.as_deref(), Some("d"));
    assert_eq!(block_on(h.store.read("/d/d/a.txt")).unwrap(), b"hi");
    assert_eq!(block_on(h.store.read("/d/d/dir/b.txt")).unwrap(), b"yo");
    assert!(block_on(h.store.stat("/d/d/empty")).unwrap().is_dir);
}

#[test]
fn archive_in_root_uses_fallback_name() {
    let h = harness();
    h.store.seed_file("/a.txt", "a").unwrap();
    let view = FolderSync::new("/", h.ctx.clone(), FolderOptions::default());

    assert_eq!(block_on(view.archive(&names(&["/a.txt"]))).unwrap(), "archive.zip");
}

#[test]
fn extract_into_existing_folder_changes_nothing() {
    let h = harness();
    let bytes = archive::compress(&[ArchiveEntry::file("p.jpg", "jpeg")]).unwrap();
    h.store.seed_file("/d/photos.zip", bytes).unwrap();
    h.store.seed_dir("/d/photos").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    assert_eq!(block_on(view.extract("/d/photos.zip")).unwrap(), None);
    assert!(block_on(h.store.list("/d/photos")).unwrap().is_empty());
}

#[test]
fn extract_rejects_corrupt_archives() {
    let h = harness();
    h.store.seed_file("/d/bad.zip", "not a zip").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    let err = block_on(view.extract("/d/bad.zip")).unwrap_err();
    assert!(matches!(err, FsError::CorruptArchive(_)));
    assert!(!block_on(h.store.exists("/d/bad")).unwrap());
}

#[test]
fn deleting_a_vanished_file_is_not_an_error() {
    let h = harness();
    h.store.seed_file("/d/keep.txt", "k").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());
    block_on(view.sync()).unwrap();

    block_on(view.delete_entry("/d/ghost.txt")).unwrap();
    block_on(view.process_pending_changes()).unwrap();
    assert_eq!(view.names(), names(&["keep.txt"]));
}

#[test]
fn delete_removes_entry_and_blurs_it() {
    let h = harness();
    h.store.seed_file("/d/a.txt", "a").unwrap();
    h.store.seed_file("/d/b.txt", "b").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());
    block_on(view.sync()).unwrap();

    block_on(view.delete_entry("/d/a.txt")).unwrap();
    block_on(view.process_pending_changes()).unwrap();

    assert_eq!(view.names(), names(&["b.txt"]));
    assert!(h.host.blurred.lock().contains(&Some("a.txt".to_string())));
}

#[test]
fn download_offers_single_files_directly_and_zips_the_rest() {
    let h = harness();
    h.store.seed_file("/d/a.txt", "hi").unwrap();
    h.store.seed_file("/d/b.txt", "yo").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    assert_eq!(block_on(view.download(&names(&["/d/a.txt"]))).unwrap(), "a.txt");
    assert_eq!(block_on(view.download(&names(&["/d/a.txt", "/d/b.txt"]))).unwrap(), "download.zip");

    {
        let offered = h.host.offered.lock();
        assert_eq!(offered[0], ("a.txt".to_string(), b"hi".to_vec()));
        let zipped = archive::decompress(&offered[1].1, ArchiveKind::Zip).unwrap();
        assert_eq!(zipped.len(), 2);
    }
    assert_eq!(*h.host.revoked.lock(), names(&["blob:1"]));

    drop(view);
    assert_eq!(*h.host.revoked.lock(), names(&["blob:1", "blob:2"]));
}

#[test]
fn cut_paste_moves_and_clears_clipboard() {
    let h = harness();
    h.store.seed_file("/src/a.txt", "a").unwrap();
    h.store.seed_dir("/dst").unwrap();
    let view = FolderSync::new("/dst", h.ctx.clone(), FolderOptions::default());
    block_on(view.sync()).unwrap();

    h.ctx.clipboard.cut(["/src/a.txt"]);
    assert_eq!(block_on(view.paste_from_clipboard()).unwrap(), names(&["a.txt"]));

    assert!(h.ctx.clipboard.is_empty());
    assert!(!block_on(h.store.exists("/src/a.txt")).unwrap());
    block_on(view.process_pending_changes()).unwrap();
    assert_eq!(view.names(), names(&["a.txt"]));
}

#[test]
fn copy_paste_can_repeat_with_fresh_names() {
    let h = harness();
    h.store.seed_file("/src/b.txt", "b").unwrap();
    h.store.seed_dir("/dst").unwrap();
    let view = FolderSync::new("/dst", h.ctx.clone(), FolderOptions::default());

    h.ctx.clipboard.copy(["/src/b.txt"]);
    assert_eq!(block_on(view.paste_from_clipboard()).unwrap(), names(&["b.txt"]));
    assert_eq!(block_on(view.paste_from_clipboard()).unwrap(), names(&["b (1).txt"]));

    assert_eq!(h.ctx.clipboard.len(), 1);
    assert!(block_on(h.store.exists("/src/b.txt")).unwrap());
}

#[test]
fn copying_a_folder_into_itself_terminates() {
    let h = harness();
    h.store.seed_file("/d/folder/x.txt", "x").unwrap();
    let view = FolderSync::new("/d/folder", h.ctx.clone(), FolderOptions::default());

    h.ctx.clipboard.copy(["/d/folder"]);
    assert_eq!(block_on(view.paste_from_clipboard()).unwrap(), names(&["folder"]));
    assert_eq!(block_on(h.store.list("/d/folder/folder")).unwrap(), names(&["x.txt"]));
}

#[test]
fn moving_a_folder_into_its_own_subtree_is_skipped() {
    let h = harness();
    h.store.seed_dir("/d/sub").unwrap();
    let view = FolderSync::new("/d/sub", h.ctx.clone(), FolderOptions::default());

    h.ctx.clipboard.cut(["/d"]);
    assert!(block_on(view.paste_from_clipboard()).unwrap().is_empty());
    assert!(block_on(h.store.exists("/d/sub")).unwrap());
}

#[test]
fn create_entry_picks_free_names_and_drives_focus() {
    let h = harness();
    h.store.seed_file("/d/New Text Document.txt", "").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    let name = block_on(view.create_entry("New Text Document.txt", Some(Vec::new()), true)).unwrap();
    assert_eq!(name, "New Text Document (1).txt");
    assert_eq!(*h.host.renaming.lock(), names(&["New Text Document (1).txt"]));

    let folder = block_on(view.create_entry("New folder", None, false)).unwrap();
    assert_eq!(folder, "New folder");
    assert_eq!(*h.host.focused.lock(), names(&["New folder"]));
    assert_eq!(*h.host.blurred.lock(), vec![None]);
}

#[test]
fn add_to_folder_writes_every_file() {
    let h = harness();
    h.store.seed_dir("/d").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    let added = block_on(view.add_to_folder(vec![
        ("photo.png".to_string(), b"png".to_vec()),
        ("photo.png".to_string(), b"png2".to_vec()),
    ]))
    .unwrap();
    assert_eq!(added, names(&["photo.png", "photo (1).png"]));
}

#[test]
fn shortcuts_record_target_and_system_classification() {
    let h = harness();
    h.store.seed_file("/d/a.txt", "a").unwrap();
    h.store.seed_file("/d/Browser.url", "[InternetShortcut]\nBaseURL=Browser\nURL=/\n").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    let name = block_on(view.create_shortcut("/d/a.txt", "Notepad")).unwrap();
    assert_eq!(name, "a.txt - Shortcut.url");
    let contents = block_on(h.store.read("/d/a.txt - Shortcut.url")).unwrap();
    let record = shortcut::decode_bytes(&contents, &h.ctx.config.system_processes);
    assert_eq!(record.base_url, "Notepad");
    assert_eq!(record.url, "/d/a.txt");
    assert_eq!(record.kind, ShortcutKind::User);

    block_on(view.sync()).unwrap();
    let listing = view.listing();
    assert!(listing.get("Browser.url").unwrap().system_shortcut);
    assert!(!listing.get("a.txt - Shortcut.url").unwrap().system_shortcut);
}

#[test]
fn unreadable_entries_are_skipped() {
    let h = harness();
    h.store.seed_file("/d/ok.txt", "ok").unwrap();
    h.store.seed_file("/d/locked.txt", "no").unwrap();
    h.store.mark_unreadable("/d/locked.txt");
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    block_on(view.sync()).unwrap();
    assert_eq!(view.names(), names(&["ok.txt"]));
}

#[test]
fn vanished_directory_closes_its_views() {
    let h = harness();
    let view = FolderSync::new("/gone", h.ctx.clone(), FolderOptions::default());

    assert!(block_on(view.refresh(None)).unwrap());
    assert!(view.listing().is_empty());
    assert_eq!(view.phase(), FolderPhase::Ready);
    assert_eq!(*h.host.closed.lock(), names(&["/gone"]));
}

#[test]
fn store_failures_propagate() {
    let h = harness();
    h.store.seed_dir("/d").unwrap();
    h.store.set_read_only(true);
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    let err = block_on(view.create_entry("x.txt", Some(b"x".to_vec()), false)).unwrap_err();
    assert!(matches!(err, FsError::Store { .. }));
}

#[test]
fn stale_refresh_is_discarded_after_switching_directory() {
    let store = Arc::new(webdesk_core::MemoryStore::new());
    store.seed_file("/one/a.txt", "a").unwrap();
    store.seed_file("/two/b.txt", "b").unwrap();
    let (gated, open) = GatedStore::new(store.clone());
    let h = harness_with(store, Arc::new(gated));
    let view = FolderSync::new("/one", h.ctx.clone(), FolderOptions::default());

    let (committed, ()) = block_on(async {
        futures::join!(view.refresh(None), async {
            view.set_directory("/two");
            let _ = open.send(());
        })
    });
    assert!(!committed.unwrap());
    assert!(view.names().is_empty());
    assert_eq!(h.sort_orders.get("/one"), None);

    block_on(view.sync()).unwrap();
    assert_eq!(view.names(), names(&["b.txt"]));
}

#[test]
fn dropping_a_view_releases_its_watch() {
    let h = harness();
    h.store.seed_dir("/d").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());
    assert_eq!(h.store.watcher_count("/d"), 1);

    view.set_directory("/e");
    assert_eq!(h.store.watcher_count("/d"), 0);
    drop(view);
    assert_eq!(h.store.watcher_count("/e"), 0);
}

#[test]
fn renames_after_an_add_survive_a_reload() {
    let h = harness();
    h.store.seed_file("/d/alpha.txt", "a").unwrap();
    h.store.seed_file("/d/beta.txt", "b").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());
    block_on(view.sync()).unwrap();

    block_on(view.create_entry("New folder", None, false)).unwrap();
    block_on(view.process_pending_changes()).unwrap();
    assert_eq!(h.sort_orders.get("/d"), Some(names(&["alpha.txt", "beta.txt", "New folder"])));

    block_on(view.rename("/d/alpha.txt", "gamma.txt")).unwrap();
    block_on(view.process_pending_changes()).unwrap();
    assert_eq!(view.names(), names(&["gamma.txt", "beta.txt", "New folder"]));

    view.reset();
    block_on(view.sync()).unwrap();
    assert_eq!(view.names(), names(&["gamma.txt", "beta.txt", "New folder"]));
}

#[test]
fn removals_update_the_persisted_order() {
    let h = harness();
    for name in ["a.txt", "b.txt", "c.txt"] {
        h.store.seed_file(&format!("/d/{name}"), "x").unwrap();
    }
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());
    block_on(view.sync()).unwrap();

    block_on(view.delete_entry("/d/b.txt")).unwrap();
    block_on(view.process_pending_changes()).unwrap();
    assert_eq!(h.sort_orders.get("/d"), Some(names(&["a.txt", "c.txt"])));

    block_on(view.rename("/d/a.txt", "z.txt")).unwrap();
    block_on(view.process_pending_changes()).unwrap();
    assert_eq!(h.sort_orders.get("/d"), Some(names(&["z.txt", "c.txt"])));
}

#[test]
fn persisted_order_with_same_members_reorders_the_listing() {
    let h = harness();
    h.store.seed_file("/d/a.txt", "a").unwrap();
    h.store.seed_file("/d/b.txt", "b").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());
    block_on(view.sync()).unwrap();
    assert_eq!(view.names(), names(&["a.txt", "b.txt"]));

    h.sort_orders.set("/d", names(&["b.txt", "a.txt"]));
    assert_eq!(view.reconcile_sort_order(), SortReconciliation::Reorder);
    assert_eq!(view.names(), names(&["b.txt", "a.txt"]));
    assert_eq!(view.reconcile_sort_order(), SortReconciliation::InSync);
}

#[test]
fn sort_by_reorders_and_persists() {
    let h = harness();
    h.store.seed_file("/d/small.txt", "s").unwrap();
    h.store.seed_file("/d/big.txt", vec![0u8; 100]).unwrap();
    h.store.seed_dir("/d/folder").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());
    block_on(view.sync()).unwrap();

    view.sort_by(SortBy::Size, false);
    assert_eq!(view.names(), names(&["folder", "big.txt", "small.txt"]));
    assert_eq!(h.sort_orders.get("/d"), Some(names(&["folder", "big.txt", "small.txt"])));

    view.sort_by(SortBy::Size, true);
    assert_eq!(view.names(), names(&["folder", "small.txt", "big.txt"]));
}

fn shortcut_icon(h: &common::Harness, view: &FolderSync, target: &str, process: &str) -> String {
    let name = block_on(view.create_shortcut(target, process)).unwrap();
    let contents = block_on(h.store.read(&format!("/d/{name}"))).unwrap();
    shortcut::decode_bytes(&contents, &h.ctx.config.system_processes).icon_file
}

#[test]
fn shortcut_icons_depend_on_extension_and_process() {
    let h = harness();
    h.store.seed_dir("/d").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());
    let config = h.ctx.config.clone();

    assert_eq!(shortcut_icon(&h, &view, "/d/Documents", "FileExplorer"), config.folder_icon);
    assert_eq!(shortcut_icon(&h, &view, "/d/README", "Vim"), config.folder_icon);
    assert_eq!(shortcut_icon(&h, &view, "/d/notes.txt", "FileExplorer"), config.folder_icon);
    assert_eq!(shortcut_icon(&h, &view, "/d/disc.iso", "FileExplorer"), config.icon_for_extension(".iso"));
    assert_eq!(shortcut_icon(&h, &view, "/d/pack.zip", "FileExplorer"), config.icon_for_extension(".zip"));
    assert_eq!(shortcut_icon(&h, &view, "/d/song.mp3", "Webamp"), config.icon_for_extension(".mp3"));
    assert_ne!(config.icon_for_extension(".iso"), config.folder_icon);
}

#[test]
fn shortcut_of_a_shortcut_copies_its_bytes() {
    let h = harness();
    let contents = b"[InternetShortcut]\nBaseURL=Terminal\nURL=/\n".to_vec();
    h.store.seed_file("/d/Terminal.url", contents.clone()).unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    let name = block_on(view.create_shortcut("/d/Terminal.url", "FileExplorer")).unwrap();
    assert_eq!(name, "Terminal (1).url");
    assert_eq!(block_on(h.store.read("/d/Terminal (1).url")).unwrap(), contents);
}

#[test]
fn shortcut_targets_with_line_breaks_stay_one_record() {
    let h = harness();
    h.store.seed_dir("/d").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    let target = "/d/a\nBaseURL=Terminal\nType=System.txt";
    let name = block_on(view.create_shortcut(target, "Vim")).unwrap();
    let contents = block_on(h.store.read(&format!("/d/{name}"))).unwrap();
    let record = shortcut::decode_bytes(&contents, &h.ctx.config.system_processes);

    assert_eq!(record.base_url, "Vim");
    assert_eq!(record.url, target);
    assert_eq!(record.kind, ShortcutKind::User);
}

#[test]
fn download_of_an_extensionless_file_is_zipped() {
    let h = harness();
    h.store.seed_file("/d/README", "read me").unwrap();
    let view = FolderSync::new("/d", h.ctx.clone(), FolderOptions::default());

    assert_eq!(block_on(view.download(&names(&["/d/README"]))).unwrap(), "download.zip");
    let offered = h.host.offered.lock();
    let zipped = archive::decompress(&offered[0].1, ArchiveKind::Zip).unwrap();
    assert_eq!(zipped, vec![ArchiveEntry::file("README", "read me")]);
}

#[test]
fn copy_paste_keeps_going_past_a_failing_child() {
    let h = harness();
    h.store.seed_file("/src/dir/a.txt", "a").unwrap();
    h.store.seed_file("/src/dir/b.txt", "b").unwrap();
    h.store.seed_dir("/dst").unwrap();
    h.store.mark_unreadable("/src/dir/a.txt");
    let view = FolderSync::new("/dst", h.ctx.clone(), FolderOptions::default());

    h.ctx.clipboard.copy(["/src/dir"]);
    let err = block_on(view.paste_from_clipboard()).unwrap_err();
    assert!(matches!(err, FsError::Store { .. }));
    assert_eq!(block_on(h.store.read("/dst/dir/b.txt")).unwrap(), b"b");
    assert!(!block_on(h.store.exists("/dst/dir/a.txt")).unwrap());
}
