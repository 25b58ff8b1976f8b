use rstdev_storage::engine::rocksdb::db::DB;
use rstdev_storage::engine::rocksdb::executor::Executor;
use rstdev_storage::engine::rocksdb::options::Options;

use rst_common::with_logging::log::info;

use crate::common::types::CommonError;
use crate::config::{Config, RocksDBCommon, RocksDBOptions};

use super::RocksStorage;

pub struct Builder {
    cfg: Config,
}

impl Builder {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub fn build(
        &mut self,
        db_callback: impl FnOnce(&Config) -> (RocksDBCommon, RocksDBOptions),
    ) -> Result<RocksStorage, CommonError> {
        let (opts_common, opts_db) = db_callback(&self.cfg);
        let (opts_path, opts_cf_name) = opts_common.get();

        info!(
            "[rocks:build] path: {} | cf: {}",
            opts_path, opts_cf_name
        );

        let mut db_opts = Options::new(opts_path, opts_cf_name.clone());
        db_opts.build_default_opts().set_db_opts(move |opt| {
            opt.create_if_missing(opts_db.get_create_if_missing());
            opt.create_missing_column_families(opts_db.get_create_missing_columns());
            opt.set_error_if_exists(opts_db.get_set_error_if_exists());
            opt.set_wal_dir(opts_db.get_set_wal_dir());

            opt
        });

        let mut db = DB::new(db_opts).map_err(|err| CommonError::DbError(err.to_string()))?;

        let db_instance = db
            .build()
            .map_err(|err| CommonError::DbError(err.to_string()))?;

        db.set_db(db_instance);

        Ok(RocksStorage::new(Executor::new(db, opts_cf_name)))
    }
}
