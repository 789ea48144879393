use billsnap_core::{FeatureRestrictions, Money, TransactionType, LEVEL_ONE_CATEGORY_PARENT_ID};
use billsnap_ocr::{
    ImageUpload, MockRecognizer, RawRecognizedItem, RecognitionConfig, RecognitionError,
    RecognitionPipeline, RecognitionRequest,
};
use billsnap_storage::{
    create_db, insert_account, insert_category, insert_tag, insert_user, SqliteBookkeeping,
};
use chrono::{FixedOffset, TimeZone};

fn shanghai() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

fn request(uid: billsnap_core::UserId) -> RecognitionRequest {
    let tz = shanghai();
    RecognitionRequest::new(uid, tz, Some(ImageUpload::new("IMG_0001.PNG", vec![0x89, 0x50, 0x4e, 0x47])))
        .with_reference_time(tz.with_ymd_and_hms(2026, 2, 20, 9, 0, 0).unwrap())
}

#[tokio::test]
async fn bill_screenshot_to_candidates_over_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_db(&dir.path().join("billsnap.db")).await.unwrap();
    let uid = insert_user(&pool, "alice", FeatureRestrictions::NONE).await.unwrap();

    let pipeline = RecognitionPipeline::new(
        RecognitionConfig::default(),
        MockRecognizer::new("京东超市 2月7日 21:49 -100.00\n余额宝收益 2月7日 22:10 +5.23\n"),
        SqliteBookkeeping::new(pool),
    );
    let response = pipeline.recognize(&request(uid)).await.unwrap();

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "transactions": [
                {
                    "type": "expense",
                    "time": 1770472140,
                    "sourceAmount": 10000,
                    "tagIds": [],
                    "comment": "京东超市"
                },
                {
                    "type": "income",
                    "time": 1770473400,
                    "sourceAmount": 523,
                    "tagIds": [],
                    "comment": "余额宝收益"
                }
            ]
        })
    );
}

#[tokio::test]
async fn structured_item_resolves_against_stored_names() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_db(&dir.path().join("billsnap.db")).await.unwrap();
    let uid = insert_user(&pool, "bob", FeatureRestrictions::NONE).await.unwrap();
    let alipay = insert_account(&pool, uid, "支付宝", false).await.unwrap();
    insert_account(&pool, uid, "旧卡", true).await.unwrap();
    let food = insert_category(
        &pool,
        uid,
        "餐饮",
        TransactionType::Expense,
        LEVEL_ONE_CATEGORY_PARENT_ID,
        false,
    )
    .await
    .unwrap();
    let market = insert_category(&pool, uid, "超市", TransactionType::Expense, food, false)
        .await
        .unwrap();
    let daily = insert_tag(&pool, uid, "日常", false).await.unwrap();

    let items = vec![
        RawRecognizedItem {
            transaction_type: "expense".to_string(),
            time: "2026-02-07 21:49".to_string(),
            amount: "88.8".to_string(),
            account_name: "支付宝".to_string(),
            category_name: "超市".to_string(),
            tag_names: vec!["日常".to_string(), "不存在".to_string()],
            description: "盒马".to_string(),
            ..Default::default()
        },
        RawRecognizedItem {
            transaction_type: "expense".to_string(),
            amount: "12.00".to_string(),
            account_name: "旧卡".to_string(),
            category_name: "餐饮".to_string(),
            ..Default::default()
        },
        // No amount: dropped without failing the batch.
        RawRecognizedItem { transaction_type: "expense".to_string(), ..Default::default() },
    ];
    let pipeline = RecognitionPipeline::new(
        RecognitionConfig::default(),
        MockRecognizer::with_items(items),
        SqliteBookkeeping::new(pool),
    );
    let txs = pipeline.recognize(&request(uid)).await.unwrap().transactions;
    assert_eq!(txs.len(), 2);

    assert_eq!(txs[0].source_amount, Money::from_cents(8880));
    assert_eq!(txs[0].source_account_id, Some(alipay));
    assert_eq!(txs[0].category_id, Some(market));
    assert_eq!(txs[0].tag_ids, vec![daily]);
    assert_eq!(txs[0].time, Some(1_770_472_140));

    // Hidden account and first-level category do not resolve.
    assert_eq!(txs[1].source_account_id, None);
    assert_eq!(txs[1].category_id, None);
    assert_eq!(txs[1].time, None);
}

#[tokio::test]
async fn restricted_user_in_storage_is_denied() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_db(&dir.path().join("billsnap.db")).await.unwrap();
    let uid = insert_user(
        &pool,
        "carol",
        FeatureRestrictions::CREATE_TRANSACTION_FROM_IMAGE_RECOGNITION,
    )
    .await
    .unwrap();

    let pipeline = RecognitionPipeline::new(
        RecognitionConfig::default(),
        MockRecognizer::new("京东超市 2月7日 21:49 -100.00"),
        SqliteBookkeeping::new(pool),
    );
    let err = pipeline.recognize(&request(uid)).await.unwrap_err();
    assert!(matches!(err, RecognitionError::PermissionDenied));
}
