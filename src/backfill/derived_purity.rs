use anyhow::Result;
use scopeguard::defer;

use crate::{
    calculation::karat_ratio,
    config,
    declare::Purity,
    ledger::{AuditStamp, Ledger, RecordKey},
    logging,
    util::map::{self, Keyable},
};

/// 為帳本中每一筆 24K 記錄補上缺少的衍生純度，回傳新增的筆數
///
/// 已存在的記錄不會被改動，沒有新增時不寫檔；帳本不存在時不做任何事。
pub fn execute(config: &config::App) -> Result<usize> {
    logging::info_file_async("補齊衍生純度開始");
    defer! {
       logging::info_file_async("補齊衍生純度結束");
    }

    let path = &config.ledger.path;
    if !path.exists() {
        let msg = format!("The ledger {} not found", path.display());
        logging::error_console(&msg);
        logging::error_file_async(msg);
        return Ok(0);
    }

    let mut ledger = Ledger::load(path)?;
    let stamp = AuditStamp::now(&config.ledger.bot_identity);
    let added = derive_missing(&mut ledger, &config.backfill.derived_purities, &stamp);

    if added > 0 {
        ledger.save()?;
    }

    logging::info_file_async(format!(
        "Backfilled {} entries into {}",
        added,
        path.display()
    ));

    Ok(added)
}

/// 依 24K 價格推算 `targets` 內的純度，鍵已存在的略過
pub fn derive_missing(ledger: &mut Ledger, targets: &[Purity], stamp: &AuditStamp) -> usize {
    let mut keys = map::key_set(ledger.records());
    let bases: Vec<(RecordKey, i64)> = ledger
        .records()
        .iter()
        .filter(|r| r.purity == Purity::K24.label())
        .map(|r| (r.key(), r.price_per_gm))
        .collect();

    let mut added = 0;
    for (key, price_24k) in bases {
        for (purity, price) in karat_ratio::derive_all(price_24k, targets) {
            let derived = key.with_purity(purity);
            // 同一個鍵若有多筆 24K，只以第一筆推算
            if !keys.insert(derived.clone()) {
                continue;
            }

            if ledger.insert_if_absent(derived, price, stamp) {
                added += 1;
            }
        }
    }

    added
}
