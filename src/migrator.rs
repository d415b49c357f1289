use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240115_000001_create_buyers_table::Migration),
            Box::new(m20240115_000002_create_cars_table::Migration),
            Box::new(m20240115_000003_create_movements_table::Migration),
            Box::new(m20240115_000004_create_operations_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240115_000001_create_buyers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000001_create_buyers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Buyers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Buyers::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Buyers::Name).string_len(200).not_null())
                        .col(ColumnDef::new(Buyers::Phone).string_len(20).null())
                        .col(ColumnDef::new(Buyers::Email).string_len(100).null())
                        .to_owned(),
                )
                .await?;

            // Name is a natural key for lookup, deliberately not unique
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_buyers_name")
                        .table(Buyers::Table)
                        .col(Buyers::Name)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Buyers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Buyers {
        Table,
        Id,
        Name,
        Phone,
        Email,
    }
}

mod m20240115_000002_create_cars_table {

    use super::m20240115_000001_create_buyers_table::Buyers;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000002_create_cars_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Cars::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Cars::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Cars::Vin).string_len(17).not_null())
                        .col(ColumnDef::new(Cars::Model).string_len(100).not_null())
                        .col(ColumnDef::new(Cars::Color).string_len(50).not_null())
                        .col(
                            ColumnDef::new(Cars::PurchasePrice)
                                .decimal_len(12, 2)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Cars::SalePrice).decimal_len(12, 2).null())
                        .col(ColumnDef::new(Cars::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Cars::Location).string_len(100).not_null())
                        .col(ColumnDef::new(Cars::ArrivalDate).date_time().not_null())
                        .col(ColumnDef::new(Cars::SaleDate).date_time().null())
                        .col(ColumnDef::new(Cars::BuyerId).integer().null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cars_buyer_id")
                                .from(Cars::Table, Cars::BuyerId)
                                .to(Buyers::Table, Buyers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            // The VIN uniqueness invariant is enforced at storage level so a
            // racing insert surfaces as a constraint conflict
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_cars_vin")
                        .table(Cars::Table)
                        .col(Cars::Vin)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cars_status")
                        .table(Cars::Table)
                        .col(Cars::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Cars::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Cars {
        Table,
        Id,
        Vin,
        Model,
        Color,
        PurchasePrice,
        SalePrice,
        Status,
        Location,
        ArrivalDate,
        SaleDate,
        BuyerId,
    }
}

mod m20240115_000003_create_movements_table {

    use super::m20240115_000002_create_cars_table::Cars;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000003_create_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Movements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Movements::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Movements::CarId).integer().not_null())
                        .col(ColumnDef::new(Movements::Date).date_time().not_null())
                        .col(
                            ColumnDef::new(Movements::FromLocation)
                                .string_len(100)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Movements::ToLocation)
                                .string_len(100)
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_movements_car_id")
                                .from(Movements::Table, Movements::CarId)
                                .to(Cars::Table, Cars::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_movements_car_id")
                        .table(Movements::Table)
                        .col(Movements::CarId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_movements_date")
                        .table(Movements::Table)
                        .col(Movements::Date)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Movements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Movements {
        Table,
        Id,
        CarId,
        Date,
        FromLocation,
        ToLocation,
    }
}

mod m20240115_000004_create_operations_table {

    use super::m20240115_000002_create_cars_table::Cars;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000004_create_operations_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Operations::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Operations::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Operations::CarId).integer().null())
                        .col(ColumnDef::new(Operations::Kind).string_len(20).not_null())
                        .col(ColumnDef::new(Operations::Date).date_time().not_null())
                        .col(ColumnDef::new(Operations::Details).text().null())
                        .col(
                            ColumnDef::new(Operations::PerformedBy)
                                .string_len(100)
                                .not_null()
                                .default("system"),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_operations_car_id")
                                .from(Operations::Table, Operations::CarId)
                                .to(Cars::Table, Cars::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_operations_car_id")
                        .table(Operations::Table)
                        .col(Operations::CarId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_operations_kind")
                        .table(Operations::Table)
                        .col(Operations::Kind)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Operations::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Operations {
        Table,
        Id,
        CarId,
        Kind,
        Date,
        Details,
        PerformedBy,
    }
}
