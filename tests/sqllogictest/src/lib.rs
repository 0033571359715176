use plparam::main_entry::{DatabaseError, Session};
use plparam::util::record_batch_to_string;
use sqllogictest::{AsyncDB, Runner};

pub fn test_run(sqlfile: &str) {
    let session = Session::default();
    println!("init session for {}", sqlfile);

    let mut tester = Runner::new(SessionWrapper { session });
    tester.run_file(sqlfile).unwrap()
}

struct SessionWrapper {
    session: Session,
}

#[async_trait::async_trait]
impl AsyncDB for SessionWrapper {
    type Error = DatabaseError;
    async fn run(&mut self, sql: &str) -> Result<String, Self::Error> {
        let results = self.session.run(sql)?;
        let mut output = String::new();
        for result in results.iter() {
            if let Some(batch) = result.to_record_batch()? {
                output.push_str(&record_batch_to_string(&batch)?);
            }
        }
        Ok(output)
    }
}
