use contactbook_core::db::open_db_in_memory;
use contactbook_core::{
    seed_contacts, Contact, ContactBook, ContactBookError, ContactDraft, ContactRepository,
    FsImageStore, Gender, KeyValueStore, KvContactRepository, MemoryKeyValueStore, PhotoChange,
    RepoError, RepoResult, SqliteKeyValueStore, CONTACTS_KEY,
};
use uuid::Uuid;

fn draft(first: &str, last: &str, company: &str, gender: Gender) -> ContactDraft {
    ContactDraft::new(first, last, company, Some(gender))
}

fn stored(repo: &KvContactRepository<&MemoryKeyValueStore>) -> Vec<Contact> {
    repo.load_all()
}

#[test]
fn empty_store_opens_with_two_seed_contacts() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let book = ContactBook::open(&repo, FsImageStore::new(dir.path()));

    let names: Vec<_> = book
        .contacts()
        .iter()
        .map(|c| (c.first_name.as_str(), c.last_name.as_str(), c.company.as_str()))
        .collect();
    assert_eq!(
        names,
        vec![("Faizan", "Shakeel", "iOS"), ("Hassan", "Shahid", "iOS")]
    );
    assert!(book.contacts().iter().all(|c| c.image_path.is_none()));
    // Seeds are not written until something changes.
    assert!(stored(&repo).is_empty());
}

#[test]
fn seeds_are_persisted_by_first_mutation() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));

    book.create(&draft("Ada", "Lovelace", "Acme", Gender::Female), None)
        .unwrap();

    let saved = stored(&repo);
    assert_eq!(saved.len(), 3);
    assert_eq!(&saved[..2], &seed_contacts()[..]);
}

#[test]
fn create_appends_contact_with_fresh_id_and_no_photo() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));
    let before = book.len();

    let created = book
        .create(&draft("Ada", "Lovelace", "Acme", Gender::Female), None)
        .unwrap();

    assert_eq!(book.len(), before + 1);
    assert_eq!(book.contacts().last(), Some(&created));
    assert_eq!(created.gender, Gender::Female);
    assert_eq!(created.image_path, None);
    assert_eq!(
        book.contacts().iter().filter(|c| c.id == created.id).count(),
        1
    );

    let reloaded = ContactBook::open(&repo, FsImageStore::new(dir.path()));
    let loaded = reloaded.get(created.id).unwrap();
    assert_eq!(loaded.first_name, "Ada");
    assert_eq!(loaded.last_name, "Lovelace");
    assert_eq!(loaded.company, "Acme");
}

#[test]
fn create_rejects_incomplete_draft_without_touching_collection() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));

    let missing_gender = ContactDraft::new("Ada", "Lovelace", "", None);
    let err = book.create(&missing_gender, None).unwrap_err();
    assert!(matches!(err, ContactBookError::Validation(_)));
    assert_eq!(book.len(), 2);
    assert!(stored(&repo).is_empty());
}

#[test]
fn create_stores_photo_under_contact_id() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let images = FsImageStore::new(dir.path().join("images"));
    let mut book = ContactBook::open(&repo, images.clone());

    let created = book
        .create(
            &draft("Ada", "Lovelace", "", Gender::Female),
            Some(&b"jpeg-bytes"[..]),
        )
        .unwrap();

    let expected = images.path_for(created.id);
    assert_eq!(created.image_path.as_deref(), expected.to_str());
    assert_eq!(std::fs::read(&expected).unwrap(), b"jpeg-bytes");
    assert_eq!(book.photo_path(&created), Some(expected));
}

#[test]
fn photo_write_failure_still_adds_contact() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(blocker.join("images")));

    let created = book
        .create(
            &draft("Ada", "Lovelace", "Acme", Gender::Female),
            Some(&b"jpeg-bytes"[..]),
        )
        .unwrap();

    assert_eq!(created.image_path, None);
    assert_eq!(book.len(), 3);
    assert_eq!(stored(&repo).len(), 3);
}

#[test]
fn add_rejects_duplicate_id() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));

    let contact = Contact::new("Ada", "Lovelace", "", Gender::Female).unwrap();
    book.add(contact.clone()).unwrap();
    let err = book.add(contact.clone()).unwrap_err();

    assert!(matches!(err, ContactBookError::DuplicateId(id) if id == contact.id));
    assert_eq!(book.len(), 3);
}

#[test]
fn empty_filter_returns_everything_in_order() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));
    book.create(&draft("Ada", "Lovelace", "Acme", Gender::Female), None)
        .unwrap();

    let all: Vec<&Contact> = book.contacts().iter().collect();
    assert_eq!(book.filter(""), all);
}

#[test]
fn filter_treats_whitespace_as_part_of_the_query() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));
    let ada = book
        .create(&draft("Ada", "Lovelace", "Acme", Gender::Female), None)
        .unwrap();

    let ids = |query: &str| -> Vec<Uuid> { book.filter(query).iter().map(|c| c.id).collect() };

    assert_eq!(ids("ada"), vec![ada.id]);
    assert!(ids("ada ").is_empty());
    assert!(ids("   ").is_empty());
}

#[test]
fn filter_matches_any_field_ignoring_case() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));
    let ada = book
        .create(&draft("Ada", "Lovelace", "Acme", Gender::Female), None)
        .unwrap();
    let alan = book
        .create(&draft("Alan", "Turing", "Bletchley", Gender::Male), None)
        .unwrap();

    let ids = |query: &str| -> Vec<Uuid> { book.filter(query).iter().map(|c| c.id).collect() };

    assert_eq!(ids("LOVE"), vec![ada.id]);
    assert_eq!(ids("bletch"), vec![alan.id]);
    assert_eq!(ids("ios").len(), 2);
    assert_eq!(ids("a").len(), 4);
    assert!(ids("zzz").is_empty());
}

#[test]
fn delete_removes_exactly_one_position() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));
    book.create(&draft("Ada", "Lovelace", "", Gender::Female), None)
        .unwrap();
    let before: Vec<Contact> = book.contacts().to_vec();

    let removed = book.delete(&[1]).unwrap();

    assert_eq!(removed, vec![before[1].clone()]);
    assert_eq!(book.len(), before.len() - 1);
    assert_eq!(book.contacts()[0], before[0]);
    assert_eq!(book.contacts()[1], before[2]);
    assert_eq!(stored(&repo), book.contacts());
}

#[test]
fn delete_ignores_repeated_and_out_of_range_indices() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));
    let seeds = book.contacts().to_vec();

    let removed = book.delete(&[1, 0, 1, 7]).unwrap();

    assert_eq!(removed, seeds);
    assert!(book.is_empty());
}

#[test]
fn delete_removes_photo_file() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let images = FsImageStore::new(dir.path());
    let mut book = ContactBook::open(&repo, images.clone());
    let created = book
        .create(&draft("Ada", "Lovelace", "", Gender::Female), Some(&b"jpeg"[..]))
        .unwrap();
    let photo = images.path_for(created.id);
    assert!(photo.exists());

    book.delete_by_id(created.id).unwrap();

    assert!(!photo.exists());
    assert!(book.get(created.id).is_none());
}

#[test]
fn update_replaces_fields_and_keeps_id_and_position() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));
    let target = book.contacts()[0].clone();

    let mut changed = target.clone();
    changed.first_name = "Faiz".to_string();
    changed.company = "Android".to_string();
    changed.gender = Gender::Male;
    book.update(changed.clone()).unwrap();

    assert_eq!(book.position(target.id), Some(0));
    assert_eq!(book.contacts()[0], changed);
    assert_eq!(stored(&repo)[0], changed);
}

#[test]
fn update_with_unknown_id_fails_and_changes_nothing() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));
    let before = book.contacts().to_vec();

    let stranger = Contact::new("No", "Body", "", Gender::Unknown).unwrap();
    let err = book.update(stranger.clone()).unwrap_err();

    assert!(matches!(err, ContactBookError::NotFound(id) if id == stranger.id));
    assert_eq!(book.contacts(), &before[..]);
    assert!(stored(&repo).is_empty());
}

#[test]
fn edit_applies_draft_and_photo_changes() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let images = FsImageStore::new(dir.path());
    let mut book = ContactBook::open(&repo, images.clone());
    let created = book
        .create(&draft("Ada", "Lovelace", "", Gender::Female), Some(&b"old"[..]))
        .unwrap();
    let photo = images.path_for(created.id);

    let edited = book
        .edit(
            created.id,
            &draft("Ada", "King", "Analytical", Gender::Female),
            PhotoChange::Replace(&b"new"[..]),
        )
        .unwrap();
    assert_eq!(edited.id, created.id);
    assert_eq!(edited.last_name, "King");
    assert_eq!(edited.image_path, created.image_path);
    assert_eq!(std::fs::read(&photo).unwrap(), b"new");

    let kept = book
        .edit(
            created.id,
            &draft("Ada", "King", "", Gender::Female),
            PhotoChange::Keep,
        )
        .unwrap();
    assert_eq!(kept.image_path, created.image_path);

    let cleared = book
        .edit(
            created.id,
            &draft("Ada", "King", "", Gender::Female),
            PhotoChange::Remove,
        )
        .unwrap();
    assert_eq!(cleared.image_path, None);
    assert!(!photo.exists());
    assert_eq!(book.photo_path(&cleared), None);
}

#[test]
fn edit_unknown_id_returns_not_found() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));

    let missing = Uuid::new_v4();
    let err = book
        .edit(
            missing,
            &draft("Ada", "King", "", Gender::Female),
            PhotoChange::Keep,
        )
        .unwrap_err();
    assert!(matches!(err, ContactBookError::NotFound(id) if id == missing));
}

#[test]
fn missing_photo_file_falls_back_to_placeholder() {
    let kv = MemoryKeyValueStore::new();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));
    let created = book
        .create(&draft("Ada", "Lovelace", "", Gender::Female), Some(&b"jpeg"[..]))
        .unwrap();

    std::fs::remove_file(created.image_path.as_deref().unwrap()).unwrap();

    assert_eq!(book.photo_path(&created), None);
}

#[test]
fn book_persists_through_sqlite_store() {
    let conn = open_db_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let repo = KvContactRepository::new(SqliteKeyValueStore::try_new(&conn).unwrap());

    let created = {
        let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));
        book.delete(&[0]).unwrap();
        book.create(&draft("Ada", "Lovelace", "Acme", Gender::Female), None)
            .unwrap()
    };

    let reopened = ContactBook::open(&repo, FsImageStore::new(dir.path()));
    let names: Vec<_> = reopened
        .contacts()
        .iter()
        .map(|c| c.first_name.as_str())
        .collect();
    assert_eq!(names, vec!["Hassan", "Ada"]);
    assert!(reopened.get(created.id).is_some());
}

struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> RepoResult<Option<Vec<u8>>> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &[u8]) -> RepoResult<()> {
        Err(RepoError::MissingRequiredTable("kv_entries"))
    }
}

#[test]
fn save_failure_is_reported_after_in_memory_change() {
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(
        KvContactRepository::new(FailingStore),
        FsImageStore::new(dir.path()),
    );

    let err = book
        .create(&draft("Ada", "Lovelace", "", Gender::Female), None)
        .unwrap_err();

    assert!(matches!(err, ContactBookError::Repo(_)));
    assert_eq!(book.len(), 3);
}

#[test]
fn open_keeps_valid_stored_contacts_next_to_an_invalid_one() {
    let kv = MemoryKeyValueStore::new();
    kv.set(
        CONTACTS_KEY,
        br#"[
            {"id":"00000000-0000-4000-8000-0000000000a1","firstName":"Ada","lastName":"Lovelace","company":"Acme","gender":"Female"},
            {"id":"00000000-0000-4000-8000-0000000000a2","firstName":"Alan","lastName":"","company":"","gender":"Male"}
        ]"#,
    )
    .unwrap();
    let repo = KvContactRepository::new(&kv);
    let dir = tempfile::tempdir().unwrap();
    let mut book = ContactBook::open(&repo, FsImageStore::new(dir.path()));

    let names: Vec<_> = book.contacts().iter().map(|c| c.first_name.as_str()).collect();
    assert_eq!(names, vec!["Ada"]);

    book.create(&draft("Grace", "Hopper", "Navy", Gender::Female), None)
        .unwrap();

    let saved: Vec<_> = stored(&repo)
        .into_iter()
        .map(|c| c.first_name)
        .collect();
    assert_eq!(saved, vec!["Ada".to_string(), "Grace".to_string()]);
}
