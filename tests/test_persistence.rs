//! Store state survives a reload through `FileStorage`.

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use judi_chat::app::App;
use judi_chat::config::Config;
use judi_chat::consultation::{Attachment, Message};
use judi_chat::storage::{FileStorage, Storage};
use judi_chat::store::{ConversationStore, Theme};

fn open(dir: &TempDir) -> App {
    let config = Config::test_default(dir.path());
    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(config.storage_path()));
    App::new(&config, storage).unwrap()
}

async fn send(app: &mut App, text: &str) {
    app.composer_mut().set_input(text);
    let pending = app.submit().unwrap().unwrap();
    let done = app.dispatcher().fetch(pending).await;
    app.finish(done).unwrap();
}

#[tokio::test]
async fn reload_reproduces_list_and_selection() {
    let dir = TempDir::new().unwrap();
    let (ids, active, titles) = {
        let mut app = open(&dir);
        send(&mut app, "Landlord refuses to return my security deposit").await;
        app.new_consultation();
        send(&mut app, "Employer has not paid salary").await;
        app.open(1).unwrap();
        app.store_mut().toggle_theme();

        let store = app.store();
        (
            store.consultations().iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
            store.active_id().map(str::to_string),
            store.consultations().iter().map(|c| c.title.clone()).collect::<Vec<_>>(),
        )
    };

    let app = open(&dir);
    let store = app.store();
    assert_eq!(
        store.consultations().iter().map(|c| c.id.clone()).collect::<Vec<_>>(),
        ids
    );
    assert_eq!(store.active_id().map(str::to_string), active);
    assert_eq!(
        store.consultations().iter().map(|c| c.title.clone()).collect::<Vec<_>>(),
        titles
    );
    assert_eq!(titles[1], "Landlord refuses to return my ...");
    assert_eq!(store.theme(), Theme::Dark);
    assert_eq!(store.active().unwrap().messages.len(), 2);
    assert!(store.active().unwrap().messages[1].data.is_some());
}

#[tokio::test]
async fn attachments_are_not_persisted() {
    let dir = TempDir::new().unwrap();
    {
        let mut app = open(&dir);
        app.composer_mut().push_attachment(Attachment {
            name: "rental_agreement.pdf".into(),
            mime_type: "application/pdf".into(),
            path: PathBuf::from("/tmp/rental_agreement.pdf"),
            size: 2048,
        });
        let pending = app.submit().unwrap().unwrap();
        let c = app.store().get(&pending.consultation_id).unwrap();
        assert_eq!(c.title, "rental_agreement.pdf");
        assert_eq!(c.messages[0].attachments.len(), 1);
    }

    let app = open(&dir);
    let c = app.store().active().unwrap();
    assert_eq!(c.title, "rental_agreement.pdf");
    assert!(c.messages[0].attachments.is_empty());
    assert_eq!(c.messages[0].text, "");
}

#[test]
fn deleting_active_clears_it_across_reload() {
    let dir = TempDir::new().unwrap();
    {
        let mut app = open(&dir);
        app.new_consultation();
        app.delete(0).unwrap();
    }
    let app = open(&dir);
    assert!(app.store().consultations().is_empty());
    assert_eq!(app.store().active_id(), None);
}

#[test]
fn malformed_storage_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = ConversationStore::load(Arc::new(FileStorage::new(&path)), Theme::Dark);
    assert!(store.consultations().is_empty());
    assert_eq!(store.active_id(), None);
    assert_eq!(store.theme(), Theme::Dark);
}

#[test]
fn work_after_corruption_survives_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{ not json").unwrap();

    let id = {
        let mut store = ConversationStore::load(Arc::new(FileStorage::new(&path)), Theme::Light);
        let id = store.create();
        store
            .append_message(&id, Message::user("Neighbour blocks my driveway", vec![]))
            .unwrap();
        id
    };

    let store = ConversationStore::load(Arc::new(FileStorage::new(&path)), Theme::Light);
    assert_eq!(store.consultations().len(), 1);
    assert_eq!(store.active_id(), Some(id.as_str()));
    assert_eq!(store.active().unwrap().title, "Neighbour blocks my driveway");
    assert_eq!(
        std::fs::read_to_string(dir.path().join("storage.json.bak")).unwrap(),
        "{ not json"
    );
}
